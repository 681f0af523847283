//! 持有唯一可变快照的对局会话。
//!
//! 电脑回合被拆成两步：`schedule_ai_move` 发出一个带纪元号的令牌，
//! 延迟结束后 `resolve_ai_move` 再凭令牌落子。`reset` 会递增纪元号，
//! 因此重开之前发出的令牌到达时只会被丢弃。令牌同时记录发出时的步数，
//! 同一局里已被其他令牌抢先应答的电脑回合也按过期处理。

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::ai::{AiAgent, AiConfig};
use crate::game::{
    GameRules, GameState, IntegrityError, InvalidMoveError, RuleEngine, RuleResolution, Side,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingAiMove {
    pub epoch: u32,
    pub move_count: u32,
    pub delay_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AiMoveOutcome {
    Applied { resolution: RuleResolution },
    Stale {
        expected_epoch: u32,
        current_epoch: u32,
        expected_move: u32,
        current_move: u32,
    },
}

pub struct GameSession {
    rules: GameRules,
    state: GameState,
    epoch: u32,
    move_count: u32,
    agent: AiAgent,
}

impl GameSession {
    pub fn new(rules: GameRules, config: AiConfig) -> Result<Self, IntegrityError> {
        Self::with_agent(rules, AiAgent::new(config))
    }

    pub fn with_agent(rules: GameRules, agent: AiAgent) -> Result<Self, IntegrityError> {
        rules.validate()?;
        Ok(Self {
            rules,
            state: GameState::new(rules),
            epoch: 0,
            move_count: 0,
            agent,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// 本局已落子的步数（双方合计）。
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn ai_config(&self) -> &AiConfig {
        self.agent.config()
    }

    /// 替换当前快照（例如从 JSON 导入）。同样会让在途的电脑回合失效。
    pub fn replace_state(&mut self, state: GameState) -> Result<(), IntegrityError> {
        state.integrity_check()?;
        self.rules = state.rules;
        self.state = state;
        self.epoch = self.epoch.wrapping_add(1);
        self.move_count = 0;
        Ok(())
    }

    pub fn apply_player_move(&mut self, take: u32) -> Result<RuleResolution, InvalidMoveError> {
        let resolution = RuleEngine::apply_player_move(&self.state, take).map_err(|error| {
            warn!("rejected player take of {take}: {error}");
            error
        })?;
        self.state = resolution.state.clone();
        self.move_count = self.move_count.wrapping_add(1);
        Ok(resolution)
    }

    /// 立即执行电脑回合，延迟由调用方自行处理。
    pub fn apply_ai_move(&mut self) -> Result<RuleResolution, InvalidMoveError> {
        let resolution = self.agent.play(&self.state)?;
        self.state = resolution.state.clone();
        self.move_count = self.move_count.wrapping_add(1);
        Ok(resolution)
    }

    pub fn schedule_ai_move(&self) -> Result<PendingAiMove, InvalidMoveError> {
        if let Some(winner) = self.state.winner {
            return Err(InvalidMoveError::GameFinished { winner });
        }
        if self.state.turn != Side::Ai {
            return Err(InvalidMoveError::NotYourTurn {
                mover: Side::Ai,
                turn: self.state.turn,
            });
        }
        Ok(PendingAiMove {
            epoch: self.epoch,
            move_count: self.move_count,
            delay_ms: self.agent.config().think_delay_ms,
        })
    }

    pub fn resolve_ai_move(
        &mut self,
        pending: PendingAiMove,
    ) -> Result<AiMoveOutcome, InvalidMoveError> {
        if pending.epoch != self.epoch || pending.move_count != self.move_count {
            warn!(
                "dropping computer move from epoch {} move {} (current epoch {} move {})",
                pending.epoch, pending.move_count, self.epoch, self.move_count
            );
            return Ok(AiMoveOutcome::Stale {
                expected_epoch: pending.epoch,
                current_epoch: self.epoch,
                expected_move: pending.move_count,
                current_move: self.move_count,
            });
        }
        let resolution = self.apply_ai_move()?;
        Ok(AiMoveOutcome::Applied { resolution })
    }

    pub fn reset(&mut self) -> &GameState {
        self.state = RuleEngine::reset(self.rules);
        self.epoch = self.epoch.wrapping_add(1);
        self.move_count = 0;
        info!("game reset, epoch {}", self.epoch);
        &self.state
    }
}
