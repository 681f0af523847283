use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{GameEvent, GameRules, GameState, Side};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum InvalidMoveError {
    #[error("game already won by {winner}")]
    GameFinished { winner: Side },
    #[error("{mover} tried to move during {turn}'s turn")]
    NotYourTurn { mover: Side, turn: Side },
    #[error("take of {take} is outside {min}..={max}")]
    TakeOutOfRange { take: u32, min: u32, max: u32 },
    #[error("take of {take} exceeds the {pile} matches left")]
    TakeExceedsPile { take: u32, pile: u32 },
    #[error("invalid rules: pile {pile_size}, take range {min_take}..={max_take}")]
    InvalidRules {
        pile_size: u32,
        min_take: u32,
        max_take: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let winner = state.winner;
        Self {
            state,
            events,
            winner,
        }
    }
}

/// 状态转移引擎。所有操作都读取旧快照并返回新快照，不修改输入。
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    fn ensure_in_progress(state: &GameState) -> Result<(), InvalidMoveError> {
        if let Some(winner) = state.winner {
            return Err(InvalidMoveError::GameFinished { winner });
        }
        Ok(())
    }

    fn ensure_turn_owner(state: &GameState, mover: Side) -> Result<(), InvalidMoveError> {
        if state.turn != mover {
            return Err(InvalidMoveError::NotYourTurn {
                mover,
                turn: state.turn,
            });
        }
        Ok(())
    }

    fn ensure_take_in_range(rules: &GameRules, take: u32) -> Result<(), InvalidMoveError> {
        if take < rules.min_take || take > rules.max_take {
            return Err(InvalidMoveError::TakeOutOfRange {
                take,
                min: rules.min_take,
                max: rules.max_take,
            });
        }
        Ok(())
    }

    fn ensure_take_within_pile(state: &GameState, take: u32) -> Result<(), InvalidMoveError> {
        if take > state.pile {
            return Err(InvalidMoveError::TakeExceedsPile {
                take,
                pile: state.pile,
            });
        }
        Ok(())
    }

    fn ensure_valid_rules(rules: &GameRules) -> Result<(), InvalidMoveError> {
        rules.validate().map_err(|_| InvalidMoveError::InvalidRules {
            pile_size: rules.pile_size,
            min_take: rules.min_take,
            max_take: rules.max_take,
        })
    }

    fn ensure_can_move(state: &GameState, mover: Side) -> Result<(), InvalidMoveError> {
        Self::ensure_valid_rules(&state.rules)?;
        Self::ensure_in_progress(state)?;
        Self::ensure_turn_owner(state, mover)
    }

    fn take(state: &GameState, side: Side, requested: u32, taken: u32) -> RuleResolution {
        let mut next = state.clone();
        next.pile -= taken;
        match side {
            Side::Player => next.player_taken += taken,
            Side::Ai => next.ai_taken += taken,
        }

        let mut events = vec![GameEvent::MatchesTaken {
            side,
            requested,
            taken,
            pile_after: next.pile,
        }];

        if next.pile == 0 {
            next.winner = Some(side);
            events.push(GameEvent::GameWon { winner: side });
            info!("{side} emptied the pile and wins");
        } else {
            next.turn = side.opponent();
        }

        for event in &events {
            next.record_event(event.clone());
        }
        debug!("{side} took {taken} (requested {requested}), {} left", next.pile);

        RuleResolution::new(next, events)
    }

    /// 玩家拿取 `take` 根火柴。
    ///
    /// 当剩余数量已小于 `min_take` 时，拿走全部剩余也算合法，避免对局卡死。
    pub fn apply_player_move(
        state: &GameState,
        take: u32,
    ) -> Result<RuleResolution, InvalidMoveError> {
        Self::ensure_can_move(state, Side::Player)?;
        let clearing_short_pile = state.pile < state.rules.min_take && take == state.pile;
        if !clearing_short_pile {
            Self::ensure_take_in_range(&state.rules, take)?;
        }
        Self::ensure_take_within_pile(state, take)?;
        Ok(Self::take(state, Side::Player, take, take))
    }

    /// 以已采样的原始数量执行电脑回合：超过剩余数量时截断为剩余数量，而不是重新采样。
    pub fn apply_ai_take(
        state: &GameState,
        raw_take: u32,
    ) -> Result<RuleResolution, InvalidMoveError> {
        Self::ensure_can_move(state, Side::Ai)?;
        Self::ensure_take_in_range(&state.rules, raw_take)?;
        let taken = raw_take.min(state.pile);
        Ok(Self::take(state, Side::Ai, raw_take, taken))
    }

    pub fn apply_ai_move<R: Rng>(
        state: &GameState,
        rng: &mut R,
    ) -> Result<RuleResolution, InvalidMoveError> {
        Self::ensure_can_move(state, Side::Ai)?;
        let raw_take = Self::sample_take(&state.rules, rng)?;
        Self::apply_ai_take(state, raw_take)
    }

    /// 在 `min_take..=max_take` 中均匀采样，不考虑剩余数量。
    pub fn sample_take<R: Rng>(
        rules: &GameRules,
        rng: &mut R,
    ) -> Result<u32, InvalidMoveError> {
        Self::ensure_valid_rules(rules)?;
        Ok(rng.gen_range(rules.min_take..=rules.max_take))
    }

    pub fn legal_takes(state: &GameState) -> Vec<u32> {
        if state.is_finished() || state.pile == 0 || state.rules.validate().is_err() {
            return Vec::new();
        }
        if state.pile < state.rules.min_take {
            return vec![state.pile];
        }
        (state.rules.min_take..=state.rules.max_take.min(state.pile)).collect()
    }

    pub fn reset(rules: GameRules) -> GameState {
        GameState::new(rules)
    }
}
