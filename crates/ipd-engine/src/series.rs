//! Repeated sampling of one pairing

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SeriesConfig;
use crate::error::{EngineError, Result};
use crate::game::{run_match, MatchResult, Outcome};
use crate::history::{Side, Turn};
use crate::random::SeedSource;
use crate::strategy::StrategyFactory;

/// Win/loss/tie tally
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub first_wins: u32,
    pub second_wins: u32,
    pub ties: u32,
}

impl Record {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::FirstWins => self.first_wins += 1,
            Outcome::SecondWins => self.second_wins += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    /// `[first wins, second wins, ties]`
    pub fn as_array(&self) -> [u32; 3] {
        [self.first_wins, self.second_wins, self.ties]
    }

    pub fn total(&self) -> u32 {
        self.first_wins + self.second_wins + self.ties
    }
}

/// Aggregate of every sample in a series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    pub samples: u32,
    pub turns: u32,
    /// Points summed over all samples, per side
    pub totals: [u64; 2],
    pub record: Record,
    /// One history per sample, in sample order
    pub history: Vec<Vec<Turn>>,
    /// Cooperations summed over all samples and turns, per side
    pub cooperations: [u64; 2],
}

impl SeriesResult {
    pub fn total(&self, side: Side) -> u64 {
        self.totals[side.index()]
    }

    /// Points per sample, per side
    pub fn avg_points(&self) -> [f64; 2] {
        let n = self.samples as f64;
        [self.totals[0] as f64 / n, self.totals[1] as f64 / n]
    }

    /// Fraction of turns each side cooperated, across all samples
    pub fn cooperation_rate(&self) -> [f64; 2] {
        let n = self.samples as f64 * self.turns as f64;
        [self.cooperations[0] as f64 / n, self.cooperations[1] as f64 / n]
    }

    /// Series winner on aggregate points, tie-aware
    pub fn winner(&self) -> Outcome {
        Outcome::from_scores(self.totals[0], self.totals[1])
    }
}

/// Runs `samples` independent matches of one pairing
///
/// Every sample builds brand-new strategy instances from the factories, so
/// no per-match state survives into the next sample.
pub struct MatchSeries<'f> {
    first: &'f dyn StrategyFactory,
    second: &'f dyn StrategyFactory,
    config: SeriesConfig,
    result: Option<SeriesResult>,
}

impl<'f> MatchSeries<'f> {
    pub fn new(
        first: &'f dyn StrategyFactory,
        second: &'f dyn StrategyFactory,
        config: SeriesConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { first, second, config, result: None })
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    pub fn run(&mut self) -> Result<&SeriesResult> {
        if self.result.is_some() {
            return Err(EngineError::AlreadyRun { stage: "series" });
        }

        let matches = self.play_all()?;
        let result = aggregate(matches, &self.config)?;
        debug!(
            first = self.first.name(),
            second = self.second.name(),
            record = ?result.record.as_array(),
            totals = ?result.totals,
            "series complete"
        );

        Ok(&*self.result.insert(result))
    }

    pub fn result(&self) -> Result<&SeriesResult> {
        self.result.as_ref().ok_or(EngineError::NotRun { stage: "series" })
    }

    pub fn into_result(self) -> Result<SeriesResult> {
        self.result.ok_or(EngineError::NotRun { stage: "series" })
    }

    pub fn record(&self) -> Result<Record> {
        Ok(self.result()?.record)
    }

    pub fn totals(&self) -> Result<[u64; 2]> {
        Ok(self.result()?.totals)
    }

    pub fn avg_points(&self) -> Result<[f64; 2]> {
        Ok(self.result()?.avg_points())
    }

    pub fn cooperation_rate(&self) -> Result<[f64; 2]> {
        Ok(self.result()?.cooperation_rate())
    }

    pub fn winner(&self) -> Result<Outcome> {
        Ok(self.result()?.winner())
    }

    fn play_all(&self) -> Result<Vec<MatchResult>> {
        let samples = 0..self.config.samples;
        if self.config.parallel {
            samples.into_par_iter().map(|s| self.play_sample(s)).collect()
        } else {
            samples.map(|s| self.play_sample(s)).collect()
        }
    }

    fn play_sample(&self, sample: u32) -> Result<MatchResult> {
        let seeds = SeedSource::new(self.config.seed).child(sample as u64);
        run_match(
            self.first.build(seeds.rng(0)),
            self.second.build(seeds.rng(1)),
            self.config.turns,
            &self.config.bounds,
        )
    }
}

/// Fold sample results into a [`SeriesResult`], checking the record
fn aggregate(matches: Vec<MatchResult>, config: &SeriesConfig) -> Result<SeriesResult> {
    let mut totals = [0u64; 2];
    let mut cooperations = [0u64; 2];
    let mut record = Record::default();
    let mut history = Vec::with_capacity(matches.len());

    for result in matches {
        let coop = result.cooperation_counts();
        for side in Side::BOTH {
            totals[side.index()] += result.score(side) as u64;
            cooperations[side.index()] += coop[side.index()] as u64;
        }
        record.add(result.outcome);
        history.push(result.history);
    }

    if record.total() != config.samples {
        return Err(EngineError::RecordMismatch {
            record: record.as_array(),
            samples: config.samples,
        });
    }

    Ok(SeriesResult {
        samples: config.samples,
        turns: config.turns,
        totals,
        record,
        history,
        cooperations,
    })
}

/// Build and run a series in one call
pub fn run_series(
    first: &dyn StrategyFactory,
    second: &dyn StrategyFactory,
    config: SeriesConfig,
) -> Result<SeriesResult> {
    let mut series = MatchSeries::new(first, second, config)?;
    series.run()?;
    series.into_result()
}
