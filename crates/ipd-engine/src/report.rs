//! Tournament reporting: per-pairing summaries, standings, observers

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::Outcome;
use crate::series::Record;

/// Outcome of one ordered pairing in a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairingReport {
    /// Position in the round-robin schedule
    pub index: usize,
    /// Roster index playing side 0
    pub first: usize,
    /// Roster index playing side 1
    pub second: usize,
    pub first_name: String,
    pub second_name: String,
    pub record: Record,
    pub totals: [u64; 2],
    pub winner: Outcome,
}

impl PairingReport {
    /// `None` on a tie
    pub fn winner_name(&self) -> Option<&str> {
        match self.winner {
            Outcome::FirstWins => Some(&self.first_name),
            Outcome::SecondWins => Some(&self.second_name),
            Outcome::Tie => None,
        }
    }

    pub fn is_self_play(&self) -> bool {
        self.first == self.second
    }
}

/// `A vs. B : [w0, w1, ties] : Winner = A` (or `Tie!`)
impl fmt::Display for PairingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [w0, w1, ties] = self.record.as_array();
        write!(
            f,
            "{} vs. {} : [{}, {}, {}] : Winner = {}",
            self.first_name,
            self.second_name,
            w0,
            w1,
            ties,
            self.winner_name().unwrap_or("Tie!")
        )
    }
}

/// Final position of one roster strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// Roster index
    pub index: usize,
    pub name: String,
    /// Raw points over every pairing, both seats
    pub total_points: u64,
    /// Points per turn, normalized over samples, turns and opponents
    pub score: f64,
}

/// `Name: 2.53`
impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}", self.name, self.score)
    }
}

/// Notified as each pairing finishes. Purely observational.
pub trait PairingObserver {
    fn pairing_complete(&mut self, report: &PairingReport);
}

impl<F> PairingObserver for F
where
    F: FnMut(&PairingReport),
{
    fn pairing_complete(&mut self, report: &PairingReport) {
        self(report)
    }
}

/// Ignores every report
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl PairingObserver for NoopObserver {
    fn pairing_complete(&mut self, _report: &PairingReport) {}
}

/// Emits each report line through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl PairingObserver for LogObserver {
    fn pairing_complete(&mut self, report: &PairingReport) {
        info!(pairing = report.index, "{}", report);
    }
}

/// One `Name: score` line per standing, in the given order
pub fn scoreboard_lines(standings: &[Standing]) -> Vec<String> {
    standings.iter().map(|s| s.to_string()).collect()
}
