use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认火柴堆大小。
pub const DEFAULT_PILE_SIZE: u32 = 25;
/// 每回合最少拿取数量。
pub const DEFAULT_MIN_TAKE: u32 = 1;
/// 每回合最多拿取数量。
pub const DEFAULT_MAX_TAKE: u32 = 3;

/// 对局双方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Ai,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Ai,
            Side::Ai => Side::Player,
        }
    }
}

impl Default for Side {
    fn default() -> Self {
        Side::Player
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("player"),
            Side::Ai => f.write_str("ai"),
        }
    }
}

/// 对局规则，可覆盖以便用更小的火柴堆做测试。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameRules {
    pub pile_size: u32,
    pub min_take: u32,
    pub max_take: u32,
}

impl GameRules {
    pub fn new(pile_size: u32, min_take: u32, max_take: u32) -> Result<Self, IntegrityError> {
        let rules = Self {
            pile_size,
            min_take,
            max_take,
        };
        rules.validate()?;
        Ok(rules)
    }

    pub fn with_pile_size(mut self, pile_size: u32) -> Self {
        self.pile_size = pile_size;
        self
    }

    pub fn with_take_range(mut self, min_take: u32, max_take: u32) -> Self {
        self.min_take = min_take;
        self.max_take = max_take;
        self
    }

    pub fn validate(&self) -> Result<(), IntegrityError> {
        if self.pile_size == 0 || self.min_take == 0 || self.min_take > self.max_take {
            return Err(IntegrityError::InvalidRules {
                pile_size: self.pile_size,
                min_take: self.min_take,
                max_take: self.max_take,
            });
        }
        Ok(())
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            pile_size: DEFAULT_PILE_SIZE,
            min_take: DEFAULT_MIN_TAKE,
            max_take: DEFAULT_MAX_TAKE,
        }
    }
}

/// 由 `winner` 字段推导出的对局阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress { turn: Side },
    Finished { winner: Side },
}

/// 对局事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MatchesTaken {
        side: Side,
        requested: u32,
        taken: u32,
        pile_after: u32,
    },
    GameWon {
        winner: Side,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("invalid rules: pile {pile_size}, take range {min_take}..={max_take}")]
    InvalidRules {
        pile_size: u32,
        min_take: u32,
        max_take: u32,
    },
    #[error("pile {pile} + player {player_taken} + ai {ai_taken} does not add up to {pile_size}")]
    PileNotConserved {
        pile: u32,
        player_taken: u32,
        ai_taken: u32,
        pile_size: u32,
    },
    #[error("{winner} recorded as winner with {pile} matches left")]
    WinnerWithoutEmptyPile { winner: Side, pile: u32 },
    #[error("pile is empty but no winner is recorded")]
    EmptyPileWithoutWinner,
}

/// 对局快照。每次合法操作都会产生一个完整的新快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub pile: u32,
    pub player_taken: u32,
    pub ai_taken: u32,
    pub turn: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
    #[serde(default)]
    pub rules: GameRules,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameState {
    pub fn new(rules: GameRules) -> Self {
        Self {
            pile: rules.pile_size,
            player_taken: 0,
            ai_taken: 0,
            turn: Side::Player,
            winner: None,
            rules,
            event_log: Vec::new(),
        }
    }

    pub fn status(&self) -> GameStatus {
        match self.winner {
            Some(winner) => GameStatus::Finished { winner },
            None => GameStatus::InProgress { turn: self.turn },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn taken_by(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_taken,
            Side::Ai => self.ai_taken,
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        self.rules.validate()?;

        let total = u64::from(self.pile) + u64::from(self.player_taken) + u64::from(self.ai_taken);
        if total != u64::from(self.rules.pile_size) {
            return Err(IntegrityError::PileNotConserved {
                pile: self.pile,
                player_taken: self.player_taken,
                ai_taken: self.ai_taken,
                pile_size: self.rules.pile_size,
            });
        }

        match (self.winner, self.pile) {
            (Some(winner), pile) if pile > 0 => {
                Err(IntegrityError::WinnerWithoutEmptyPile { winner, pile })
            }
            (None, 0) => Err(IntegrityError::EmptyPileWithoutWinner),
            _ => Ok(()),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameRules::default())
    }
}
