use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{GameState, InvalidMoveError, RuleEngine, RuleResolution, Side};

/// 电脑“思考”的默认时长（毫秒）。
pub const DEFAULT_THINK_DELAY_MS: u32 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiConfig {
    #[serde(default = "default_think_delay")]
    pub think_delay_ms: u32,
}

fn default_think_delay() -> u32 {
    DEFAULT_THINK_DELAY_MS
}

impl AiConfig {
    pub fn with_think_delay(mut self, think_delay_ms: u32) -> Self {
        self.think_delay_ms = think_delay_ms;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            think_delay_ms: DEFAULT_THINK_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    /// 采样得到的原始数量。
    pub raw_take: u32,
    /// 截断到剩余数量后的实际数量。
    pub take: u32,
}

/// 均匀随机的电脑对手。
pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 预览一次决策，不修改状态。轮不到电脑、对局已结束或规则无效时返回 `None`。
    pub fn decide_take(&mut self, state: &GameState) -> Option<AiDecision> {
        if state.is_finished() || state.turn != Side::Ai {
            return None;
        }
        let raw_take = RuleEngine::sample_take(&state.rules, &mut self.rng).ok()?;
        Some(AiDecision {
            raw_take,
            take: raw_take.min(state.pile),
        })
    }

    pub fn play(&mut self, state: &GameState) -> Result<RuleResolution, InvalidMoveError> {
        RuleEngine::apply_ai_move(state, &mut self.rng)
    }
}

impl Default for AiAgent {
    fn default() -> Self {
        AiAgent::new(AiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameRules;

    fn ai_turn_with_pile(pile: u32) -> GameState {
        let mut state = GameState::default();
        state.pile = pile;
        state.player_taken = state.rules.pile_size - pile;
        state.turn = Side::Ai;
        state
    }

    #[test]
    fn ai_declines_when_not_its_turn() {
        let mut agent = AiAgent::with_seed(AiConfig::default(), 1);
        assert!(agent.decide_take(&GameState::default()).is_none());
        assert!(matches!(
            agent.play(&GameState::default()),
            Err(InvalidMoveError::NotYourTurn { mover: Side::Ai, .. })
        ));
    }

    #[test]
    fn ai_declines_under_inverted_rules() {
        let mut state = GameState::new(GameRules::default().with_take_range(3, 1));
        state.turn = Side::Ai;
        let mut agent = AiAgent::with_seed(AiConfig::default(), 4);
        assert!(agent.decide_take(&state).is_none());
        assert!(matches!(
            agent.play(&state),
            Err(InvalidMoveError::InvalidRules { .. })
        ));
    }

    #[test]
    fn seeded_agents_agree() {
        let state = ai_turn_with_pile(20);
        let mut first = AiAgent::with_seed(AiConfig::default(), 99);
        let mut second = AiAgent::with_seed(AiConfig::default(), 99);
        for _ in 0..20 {
            assert_eq!(first.decide_take(&state), second.decide_take(&state));
        }
    }

    #[test]
    fn decisions_cover_full_range_and_clamp() {
        let mut agent = AiAgent::with_seed(AiConfig::default(), 2024);
        let roomy = ai_turn_with_pile(20);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let decision = agent.decide_take(&roomy).expect("ai should move");
            assert_eq!(decision.raw_take, decision.take);
            seen[(decision.take - 1) as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit), "every take in 1..=3 should appear");

        let tight = ai_turn_with_pile(1);
        for _ in 0..50 {
            let decision = agent.decide_take(&tight).expect("ai should move");
            assert!((1..=3).contains(&decision.raw_take));
            assert_eq!(decision.take, 1);
        }
    }

    #[test]
    fn play_applies_a_legal_take() {
        let mut agent = AiAgent::with_seed(AiConfig::default(), 5);
        let state = ai_turn_with_pile(10);
        let resolution = agent.play(&state).expect("ai move should apply");
        assert!(resolution.state.ai_taken >= 1 && resolution.state.ai_taken <= 3);
        assert_eq!(resolution.state.turn, Side::Player);
        assert!(resolution.state.integrity_check().is_ok());
    }

    #[test]
    fn config_defaults_to_one_second() {
        assert_eq!(AiConfig::default().think_delay_ms, 1000);
        let parsed: AiConfig = serde_json::from_str("{}").expect("empty config should parse");
        assert_eq!(parsed, AiConfig::default());
        assert_eq!(AiConfig::default().with_think_delay(0).think_delay_ms, 0);
    }
}
