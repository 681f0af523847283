//! 电脑对手（均匀随机拿取）。

pub mod random;

pub use random::{AiAgent, AiConfig, AiDecision, DEFAULT_THINK_DELAY_MS};
