pub mod ai;
pub mod game;
pub mod logging;
pub mod session;

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use log::LevelFilter;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiConfig, AiDecision, DEFAULT_THINK_DELAY_MS};
pub use game::{
    GameEvent, GameRules, GameState, GameStatus, IntegrityError, InvalidMoveError, RuleEngine,
    RuleResolution, Side, DEFAULT_MAX_TAKE, DEFAULT_MIN_TAKE, DEFAULT_PILE_SIZE,
};
pub use session::{AiMoveOutcome, GameSession, PendingAiMove};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    logging::init_logging(LevelFilter::Info);
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn rules_from_js(rules: JsValue) -> Result<GameRules, JsValue> {
    if rules.is_undefined() || rules.is_null() {
        return Ok(GameRules::default());
    }
    let rules: GameRules = from_value(rules).map_err(JsValue::from)?;
    rules.validate().map_err(to_js_error)?;
    Ok(rules)
}

fn state_from_js(state: JsValue) -> Result<GameState, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state.integrity_check().map_err(to_js_error)?;
    Ok(state)
}

/// 界面顶部的提示语。
pub fn status_headline(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Finished {
            winner: Side::Player,
        } => "You win!",
        GameStatus::Finished { winner: Side::Ai } => "AI wins!",
        GameStatus::InProgress { turn: Side::Player } => "Your turn",
        GameStatus::InProgress { turn: Side::Ai } => "AI's turn",
    }
}

async fn resolve_after_delay(
    session: Rc<RefCell<GameSession>>,
    pending: PendingAiMove,
    delay_ms: u32,
) -> Result<AiMoveOutcome, JsValue> {
    if delay_ms > 0 {
        TimeoutFuture::new(delay_ms).await;
    }
    let outcome = session
        .borrow_mut()
        .resolve_ai_move(pending)
        .map_err(to_js_error)?;
    Ok(outcome)
}

#[derive(Serialize)]
struct PlayTurnResponse {
    player: RuleResolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai: Option<AiMoveOutcome>,
}

#[wasm_bindgen]
pub struct MatchstickEngine {
    session: Rc<RefCell<GameSession>>,
}

#[wasm_bindgen]
impl MatchstickEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(
        rules_json: Option<String>,
        seed: Option<u64>,
        think_delay_ms: Option<u32>,
    ) -> Result<MatchstickEngine, JsValue> {
        let rules = match rules_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => GameRules::default(),
        };
        let mut config = AiConfig::default();
        if let Some(delay) = think_delay_ms {
            config = config.with_think_delay(delay);
        }
        let agent = match seed {
            Some(seed) => AiAgent::with_seed(config, seed),
            None => AiAgent::new(config),
        };
        let session = GameSession::with_agent(rules, agent).map_err(to_js_error)?;
        Ok(MatchstickEngine {
            session: Rc::new(RefCell::new(session)),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(self.session.borrow().state())
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_value(self.session.borrow().state()).map_err(JsValue::from)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session
            .borrow_mut()
            .replace_state(state)
            .map_err(to_js_error)
    }

    pub fn apply_player_move(&mut self, take: u32) -> Result<String, JsValue> {
        let resolution = self
            .session
            .borrow_mut()
            .apply_player_move(take)
            .map_err(to_js_error)?;
        to_json(&resolution)
    }

    pub fn apply_ai_move(&mut self) -> Result<String, JsValue> {
        let resolution = self
            .session
            .borrow_mut()
            .apply_ai_move()
            .map_err(to_js_error)?;
        to_json(&resolution)
    }

    /// 延迟后执行电脑回合。延迟期间若重开对局，结果为 `stale` 且不改变状态。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let scheduled = self.session.borrow().schedule_ai_move();
        let session = Rc::clone(&self.session);

        future_to_promise(async move {
            let pending = scheduled.map_err(to_js_error)?;
            let delay = delay_ms.unwrap_or(pending.delay_ms);
            let outcome = resolve_after_delay(session, pending, delay).await?;
            Ok(JsValue::from_str(&to_json(&outcome)?))
        })
    }

    /// 玩家落子后立即返回 Promise，电脑在延迟结束后应答。
    pub fn play_turn(&mut self, take: u32, delay_ms: Option<u32>) -> Result<Promise, JsValue> {
        let player = self
            .session
            .borrow_mut()
            .apply_player_move(take)
            .map_err(to_js_error)?;
        let scheduled = if player.winner.is_none() {
            Some(
                self.session
                    .borrow()
                    .schedule_ai_move()
                    .map_err(to_js_error)?,
            )
        } else {
            None
        };
        let session = Rc::clone(&self.session);

        Ok(future_to_promise(async move {
            let ai = match scheduled {
                Some(pending) => {
                    let delay = delay_ms.unwrap_or(pending.delay_ms);
                    Some(resolve_after_delay(session, pending, delay).await?)
                }
                None => None,
            };
            let response = PlayTurnResponse { player, ai };
            Ok(JsValue::from_str(&to_json(&response)?))
        }))
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        to_json(self.session.borrow_mut().reset())
    }

    pub fn epoch(&self) -> u32 {
        self.session.borrow().epoch()
    }

    pub fn legal_takes(&self) -> Vec<u32> {
        RuleEngine::legal_takes(self.session.borrow().state())
    }

    pub fn status_text(&self) -> String {
        status_headline(self.session.borrow().state().status()).to_string()
    }
}

/// 返回初始对局快照，未传规则时使用默认规则。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state(rules: JsValue) -> Result<JsValue, JsValue> {
    let rules = rules_from_js(rules)?;
    to_value(&GameState::new(rules)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyPlayerMove")]
pub fn apply_player_move(state: JsValue, take: u32) -> Result<JsValue, JsValue> {
    let state = state_from_js(state)?;
    match RuleEngine::apply_player_move(&state, take) {
        Ok(resolution) => to_value(&resolution).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "applyAiMove")]
pub fn apply_ai_move(state: JsValue) -> Result<JsValue, JsValue> {
    let state = state_from_js(state)?;
    let mut agent = AiAgent::default();
    match agent.play(&state) {
        Ok(resolution) => to_value(&resolution).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "computeAiTake")]
pub fn compute_ai_take(state: JsValue) -> Result<JsValue, JsValue> {
    let state = state_from_js(state)?;
    let mut agent = AiAgent::default();
    to_value(&agent.decide_take(&state)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "resetGame")]
pub fn reset_game(rules: JsValue) -> Result<JsValue, JsValue> {
    let rules = rules_from_js(rules)?;
    to_value(&RuleEngine::reset(rules)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    state_from_js(state).map(|_| ())
}

#[wasm_bindgen(js_name = "legalTakes")]
pub fn legal_takes(state: JsValue) -> Result<Vec<u32>, JsValue> {
    let state = state_from_js(state)?;
    Ok(RuleEngine::legal_takes(&state))
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
