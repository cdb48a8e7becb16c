//! Round-robin tournament over a roster of strategy factories

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TournamentConfig;
use crate::error::{EngineError, Result};
use crate::random::SeedSource;
use crate::report::{scoreboard_lines, NoopObserver, PairingObserver, PairingReport, Standing};
use crate::series::run_series;
use crate::strategy::{StrategyFactory, StrategyKind};

/// Every ordered pair `(i, j)` over `n` entries, self-pairings included,
/// in row-major order. Always `n * n` long.
pub fn round_robin_schedule(n: usize) -> Vec<(usize, usize)> {
    let mut schedule = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            schedule.push((i, j));
        }
    }
    schedule
}

/// Result of a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    /// Roster names in roster order
    pub names: Vec<String>,
    /// Raw points per roster entry, in roster order
    pub totals: Vec<u64>,
    /// Sorted by score (descending)
    pub standings: Vec<Standing>,
    /// Every pairing, in schedule order
    pub pairings: Vec<PairingReport>,
    pub samples: u32,
    pub turns: u32,
}

impl TournamentResult {
    /// Top standing
    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first()
    }

    pub fn top_n(&self, n: usize) -> &[Standing] {
        let n = n.min(self.standings.len());
        &self.standings[..n]
    }

    /// Standing for a roster index
    pub fn standing_for(&self, index: usize) -> Option<&Standing> {
        self.standings.iter().find(|s| s.index == index)
    }

    /// One line per pairing, schedule order
    pub fn pairing_lines(&self) -> Vec<String> {
        self.pairings.iter().map(|p| p.to_string()).collect()
    }

    /// One line per strategy, best first
    pub fn scoreboard(&self) -> Vec<String> {
        scoreboard_lines(&self.standings)
    }
}

/// Round-robin tournament
///
/// Each roster entry meets every entry, itself included, once in each seat.
pub struct Tournament {
    roster: Vec<Box<dyn StrategyFactory>>,
    config: TournamentConfig,
    result: Option<TournamentResult>,
}

impl Tournament {
    pub fn new(roster: Vec<Box<dyn StrategyFactory>>, config: TournamentConfig) -> Result<Self> {
        if roster.is_empty() {
            return Err(EngineError::EmptyRoster);
        }
        config.validate()?;
        Ok(Self { roster, config, result: None })
    }

    /// Roster of built-in strategies
    pub fn from_kinds(kinds: &[StrategyKind], config: TournamentConfig) -> Result<Self> {
        for kind in kinds {
            kind.validate()?;
        }
        let roster = kinds
            .iter()
            .map(|&kind| Box::new(kind) as Box<dyn StrategyFactory>)
            .collect();
        Self::new(roster, config)
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn roster_names(&self) -> Vec<String> {
        self.roster.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn run(&mut self) -> Result<&TournamentResult> {
        self.run_with_observer(&mut NoopObserver)
    }

    /// Run every pairing, handing each finished pairing to `observer`.
    ///
    /// In parallel mode pairings are reported in schedule order once all of
    /// them have finished.
    pub fn run_with_observer(
        &mut self,
        observer: &mut dyn PairingObserver,
    ) -> Result<&TournamentResult> {
        if self.result.is_some() {
            return Err(EngineError::AlreadyRun { stage: "tournament" });
        }

        let n = self.roster.len();
        let schedule = round_robin_schedule(n);
        info!(
            strategies = n,
            pairings = schedule.len(),
            samples = self.config.samples,
            turns = self.config.turns,
            "starting tournament"
        );

        let mut totals = vec![0u64; n];
        let mut pairings = Vec::with_capacity(schedule.len());
        let mut accumulate = |report: PairingReport| {
            totals[report.first] += report.totals[0];
            totals[report.second] += report.totals[1];
            observer.pairing_complete(&report);
            pairings.push(report);
        };

        if self.config.parallel {
            let reports = schedule
                .par_iter()
                .enumerate()
                .map(|(k, &(i, j))| self.play_pairing(k, i, j))
                .collect::<Result<Vec<_>>>()?;
            reports.into_iter().for_each(&mut accumulate);
        } else {
            for (k, &(i, j)) in schedule.iter().enumerate() {
                accumulate(self.play_pairing(k, i, j)?);
            }
        }

        let standings = self.rank(&totals);
        if let Some(top) = standings.first() {
            info!(winner = %top.name, score = top.score, "tournament complete");
        }

        let result = TournamentResult {
            names: self.roster_names(),
            totals,
            standings,
            pairings,
            samples: self.config.samples,
            turns: self.config.turns,
        };
        Ok(&*self.result.insert(result))
    }

    pub fn result(&self) -> Result<&TournamentResult> {
        self.result.as_ref().ok_or(EngineError::NotRun { stage: "tournament" })
    }

    pub fn into_result(self) -> Result<TournamentResult> {
        self.result.ok_or(EngineError::NotRun { stage: "tournament" })
    }

    /// Raw points per roster entry
    pub fn scores(&self) -> Result<&[u64]> {
        Ok(&self.result()?.totals)
    }

    pub fn standings(&self) -> Result<&[Standing]> {
        Ok(&self.result()?.standings)
    }

    fn play_pairing(&self, index: usize, first: usize, second: usize) -> Result<PairingReport> {
        let seed = SeedSource::new(self.config.seed).derive(index as u64);
        let a = self.roster[first].as_ref();
        let b = self.roster[second].as_ref();
        let series = run_series(a, b, self.config.series_config(seed))?;

        debug!(index, first = a.name(), second = b.name(), "pairing complete");
        Ok(PairingReport {
            index,
            first,
            second,
            first_name: a.name().to_string(),
            second_name: b.name().to_string(),
            record: series.record,
            totals: series.totals,
            winner: series.winner(),
        })
    }

    /// Points per turn: total / (samples * turns * (roster size + 1)).
    /// The extra opponent slot accounts for self-play.
    fn normalizer(&self) -> f64 {
        let opponents = self.roster.len() as f64 + 1.0;
        self.config.samples as f64 * self.config.turns as f64 * opponents
    }

    fn rank(&self, totals: &[u64]) -> Vec<Standing> {
        let norm = self.normalizer();
        let mut standings: Vec<Standing> = self
            .roster
            .iter()
            .zip(totals)
            .enumerate()
            .map(|(index, (factory, &total_points))| Standing {
                index,
                name: factory.name().to_string(),
                total_points,
                score: total_points as f64 / norm,
            })
            .collect();

        // Same normalizer for everyone, so raw totals give an exact order;
        // the stable sort keeps roster order among equals.
        standings.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        standings
    }
}

/// Build and run a tournament of built-in strategies in one call
pub fn run_tournament(kinds: &[StrategyKind], config: TournamentConfig) -> Result<TournamentResult> {
    let mut tournament = Tournament::from_kinds(kinds, config)?;
    tournament.run()?;
    tournament.into_result()
}
