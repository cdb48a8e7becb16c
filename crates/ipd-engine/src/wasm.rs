//! WASM bindings for browser replay of matches, series and tournaments

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{
    run_match, run_series, run_tournament, SeedSource, SeriesConfig, StrategyFactory,
    StrategyKind, TournamentConfig, TurnBounds,
};

/// Parse a strategy given either as serde JSON or as a plain name.
///
/// Accepts:
/// - Name:  `"TitForTat"`, `"tit-for-tat"`, `"joss:0.2"`
/// - JSON:  `"TitForTat"` (quoted) or `{"Joss": {"defect_probability": 0.2}}`
fn parse_kind(input: &str) -> Result<StrategyKind, String> {
    if let Ok(kind) = serde_json::from_str::<StrategyKind>(input) {
        kind.validate().map_err(|e| e.to_string())?;
        return Ok(kind);
    }
    input.parse::<StrategyKind>().map_err(|e| e.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Replay a match with full turn-by-turn details
///
/// # Arguments
/// * `first` - Strategy for side 0
/// * `second` - Strategy for side 1
/// * `turns` - Turn count, within the standard [10, 599] bounds
/// * `seed` - Root seed for the strategies' random streams
///
/// # Returns
/// Serialized MatchResult
#[wasm_bindgen]
pub fn replay_match(first: &str, second: &str, turns: u32, seed: u64) -> Result<JsValue, JsError> {
    let a = parse_kind(first).map_err(|e| JsError::new(&format!("Invalid strategy A: {}", e)))?;
    let b = parse_kind(second).map_err(|e| JsError::new(&format!("Invalid strategy B: {}", e)))?;

    let seeds = SeedSource::new(seed);
    let result = run_match(a.build(seeds.rng(0)), b.build(seeds.rng(1)), turns, &TurnBounds::standard())
        .map_err(|e| JsError::new(&e.to_string()))?;

    to_js(&result)
}

/// Run a series of matches between two strategies
///
/// `config_json` is a SeriesConfig; missing fields take their defaults.
#[wasm_bindgen]
pub fn replay_series(first: &str, second: &str, config_json: &str) -> Result<JsValue, JsError> {
    let a = parse_kind(first).map_err(|e| JsError::new(&format!("Invalid strategy A: {}", e)))?;
    let b = parse_kind(second).map_err(|e| JsError::new(&format!("Invalid strategy B: {}", e)))?;
    let config: SeriesConfig = serde_json::from_str(config_json)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;

    let result = run_series(&a, &b, config).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&result)
}

/// Run a round-robin tournament
///
/// # Arguments
/// * `roster_json` - JSON array of strategy names or serialized kinds
/// * `config_json` - TournamentConfig; missing fields take their defaults
#[wasm_bindgen]
pub fn replay_tournament(roster_json: &str, config_json: &str) -> Result<JsValue, JsError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(roster_json)
        .map_err(|e| JsError::new(&format!("Invalid roster: {}", e)))?;
    let roster = entries
        .iter()
        .map(|entry| match entry {
            serde_json::Value::String(name) => parse_kind(name),
            other => parse_kind(&other.to_string()),
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| JsError::new(&format!("Invalid roster: {}", e)))?;
    let config: TournamentConfig = serde_json::from_str(config_json)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;

    let result = run_tournament(&roster, config).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&result)
}

/// Get human-readable description of a strategy
#[wasm_bindgen]
pub fn get_strategy_description(strategy: &str) -> Result<String, JsError> {
    let kind = parse_kind(strategy).map_err(|e| JsError::new(&format!("Invalid strategy: {}", e)))?;
    Ok(kind.describe())
}

#[derive(serde::Serialize)]
struct StrategyInfo {
    id: &'static str,
    description: String,
}

/// Get all built-in strategies
#[wasm_bindgen]
pub fn get_strategy_types() -> Result<JsValue, JsError> {
    let types: Vec<StrategyInfo> = StrategyKind::ALL
        .iter()
        .map(|kind| StrategyInfo { id: kind.name(), description: kind.describe() })
        .collect();
    to_js(&types)
}
