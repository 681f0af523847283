//! Binding-layer tests, run with `wasm-pack test --node` (or `--headless --chrome`).

#![cfg(target_arch = "wasm32")]

use matchstick_core::{
    apply_player_move, create_game_state, logging, validate_state, GameState, InvalidMoveError,
    MatchstickEngine, RuleResolution, Side,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

fn engine(rules_json: Option<&str>) -> MatchstickEngine {
    MatchstickEngine::new(rules_json.map(str::to_string), Some(7), Some(0))
        .expect("engine should construct")
}

fn parse_state(json: &str) -> GameState {
    serde_json::from_str(json).expect("state json should parse")
}

#[wasm_bindgen_test]
fn engine_starts_with_default_pile() {
    let engine = engine(None);
    let state = parse_state(&engine.state_json().expect("state should serialize"));
    assert_eq!(state.pile, 25);
    assert_eq!(engine.legal_takes(), vec![1, 2, 3]);
    assert_eq!(engine.status_text(), "Your turn");
}

#[wasm_bindgen_test]
fn invalid_take_surfaces_typed_error() {
    let mut engine = engine(None);
    let error = engine
        .apply_player_move(4)
        .expect_err("taking four should be rejected");
    let error: InvalidMoveError =
        serde_wasm_bindgen::from_value(error).expect("error should be structured");
    assert_eq!(
        error,
        InvalidMoveError::TakeOutOfRange {
            take: 4,
            min: 1,
            max: 3
        }
    );
}

#[wasm_bindgen_test]
fn invalid_rules_are_rejected() {
    assert!(MatchstickEngine::new(Some(r#"{"pile_size":0}"#.into()), None, None).is_err());
}

#[wasm_bindgen_test]
async fn play_turn_resolves_with_computer_reply() {
    logging::set_log_level("debug").expect("debug is a valid level");
    let mut engine = engine(Some(r#"{"pile_size":10}"#));
    let promise = engine.play_turn(2, Some(5)).expect("player move is legal");
    let value = JsFuture::from(promise).await.expect("computer reply resolves");
    let json = value.as_string().expect("reply is a json string");
    let reply: serde_json::Value = serde_json::from_str(&json).expect("reply parses");

    assert_eq!(reply["player"]["state"]["pile"], 8);
    assert_eq!(reply["ai"]["outcome"], "applied");
    let state = parse_state(&engine.state_json().expect("state should serialize"));
    assert_eq!(state.turn, Side::Player);
    assert!(state.pile < 8);
}

#[wasm_bindgen_test]
async fn reset_during_think_delay_discards_computer_move() {
    let mut engine = engine(None);
    engine.apply_player_move(3).expect("player move is legal");
    let promise = engine.think_ai(Some(20));
    engine.reset().expect("reset should serialize");

    let value = JsFuture::from(promise).await.expect("stale move still resolves");
    let reply: serde_json::Value =
        serde_json::from_str(&value.as_string().expect("json string")).expect("reply parses");
    assert_eq!(reply["outcome"], "stale");
    assert_eq!(engine.epoch(), 1);

    let state = parse_state(&engine.state_json().expect("state should serialize"));
    assert_eq!(state, GameState::default());
}

#[wasm_bindgen_test]
fn stateless_functions_round_trip_snapshots() {
    let initial = create_game_state(JsValue::UNDEFINED).expect("initial state");
    validate_state(initial.clone()).expect("initial state is consistent");

    let resolution = apply_player_move(initial, 3).expect("opening take is legal");
    let resolution: RuleResolution =
        serde_wasm_bindgen::from_value(resolution).expect("resolution is structured");
    assert_eq!(resolution.state.pile, 22);
    assert_eq!(resolution.state.turn, Side::Ai);
}
