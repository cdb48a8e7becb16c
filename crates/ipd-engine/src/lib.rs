//! Iterated Prisoner's Dilemma engine
//!
//! Three layers, each built only on the one below it:
//! - [`Match`]: one pairing for a fixed number of turns
//! - [`MatchSeries`]: many independent matches of one pairing
//! - [`Tournament`]: a series for every ordered pairing of a roster
//!
//! This crate is compiled to:
//! - Native (for the `ipd` command line)
//! - WASM (for browser replay, `wasm` feature)

mod config;
mod error;
mod game;
mod history;
mod random;
mod report;
mod series;
mod strategy;
mod tournament;

#[cfg(feature = "wasm")]
mod wasm;

pub use config::{SeriesConfig, TournamentConfig, TurnBounds};
pub use error::{EngineError, ErrorKind, Result};
pub use game::{run_match, Match, MatchResult, Outcome, RoundResult};
pub use history::{History, Side, Turn};
pub use random::{SeedSource, StrategyRng};
pub use report::{
    scoreboard_lines, LogObserver, NoopObserver, PairingObserver, PairingReport, Standing,
};
pub use series::{run_series, MatchSeries, Record, SeriesResult};
pub use strategy::{
    AlwaysCooperate, AlwaysDefect, Decision, FnFactory, GrudgeHolder, Gradual, Joss, Pavlov,
    RandomChoice, Strategy, StrategyFactory, StrategyKind, SuspiciousTitForTat, TitForTat,
    TitForTwoTats,
};
pub use tournament::{round_robin_schedule, run_tournament, Tournament, TournamentResult};

/// Payoffs indexed by `[own][opponent]` (Cooperate = 0, Defect = 1),
/// each entry `(own payoff, opponent payoff)`
pub const PAYOFF_MATRIX: [[(u32, u32); 2]; 2] = [
    [(3, 3), (0, 5)],
    [(5, 0), (1, 1)],
];

/// Payoff matrix for the Prisoner's Dilemma
/// Returns (score_a, score_b)
pub fn payoff(a: Decision, b: Decision) -> (u32, u32) {
    PAYOFF_MATRIX[a.index()][b.index()]
}
