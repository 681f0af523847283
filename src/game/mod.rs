//! 游戏核心逻辑模块（状态快照、状态转移）。

pub mod rules;
pub mod state;

pub use rules::{InvalidMoveError, RuleEngine, RuleResolution};
pub use state::{
    GameEvent,
    GameRules,
    GameState,
    GameStatus,
    IntegrityError,
    Side,
    DEFAULT_MAX_TAKE,
    DEFAULT_MIN_TAKE,
    DEFAULT_PILE_SIZE,
};
