//! Configuration types for matches, series and tournaments

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Inclusive range of turn counts a match accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnBounds {
    pub min: u32,
    pub max: u32,
}

impl TurnBounds {
    pub const STANDARD_MIN: u32 = 10;
    pub const STANDARD_MAX: u32 = 599;

    pub fn new(min: u32, max: u32) -> Result<Self> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    /// The default [10, 599] range
    pub fn standard() -> Self {
        Self { min: Self::STANDARD_MIN, max: Self::STANDARD_MAX }
    }

    /// Any positive turn count up to the standard maximum
    pub fn relaxed() -> Self {
        Self { min: 1, max: Self::STANDARD_MAX }
    }

    /// Standard maximum with a caller-chosen minimum
    pub fn with_min(min: u32) -> Result<Self> {
        Self::new(min, Self::STANDARD_MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.min > self.max {
            return Err(EngineError::InvalidTurnBounds { min: self.min, max: self.max });
        }
        Ok(())
    }

    pub fn contains(&self, turns: u32) -> bool {
        (self.min..=self.max).contains(&turns)
    }

    /// Reject `turns` unless it lies inside the bounds
    pub fn check(&self, turns: u32) -> Result<()> {
        self.validate()?;
        if !self.contains(turns) {
            return Err(EngineError::TurnCountOutOfRange {
                turns,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for TurnBounds {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parameters for one [`MatchSeries`](crate::MatchSeries)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Independent matches to play
    pub samples: u32,
    /// Turns per match
    pub turns: u32,
    pub bounds: TurnBounds,
    /// Root seed for every strategy RNG stream in the series
    pub seed: u64,
    /// Run samples on the rayon pool
    pub parallel: bool,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            samples: 10,
            turns: 100,
            bounds: TurnBounds::standard(),
            seed: 0,
            parallel: false,
        }
    }
}

impl SeriesConfig {
    pub fn new(samples: u32, turns: u32) -> Self {
        Self { samples, turns, ..Default::default() }
    }

    pub fn with_bounds(mut self, bounds: TurnBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(EngineError::ZeroSamples);
        }
        self.bounds.check(self.turns)
    }
}

/// Tournament configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Matches per pairing
    pub samples: u32,
    /// Turns per match
    pub turns: u32,
    pub bounds: TurnBounds,
    pub seed: u64,
    /// Run pairings on the rayon pool
    pub parallel: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            samples: 50,
            turns: 200,
            bounds: TurnBounds::standard(),
            seed: 0,
            parallel: false,
        }
    }
}

impl TournamentConfig {
    pub fn new(samples: u32, turns: u32) -> Self {
        Self { samples, turns, ..Default::default() }
    }

    pub fn with_bounds(mut self, bounds: TurnBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(EngineError::ZeroSamples);
        }
        self.bounds.check(self.turns)
    }

    /// Series parameters for one pairing. Samples always run sequentially
    /// inside a pairing; parallelism, if any, is across pairings.
    pub fn series_config(&self, series_seed: u64) -> SeriesConfig {
        SeriesConfig {
            samples: self.samples,
            turns: self.turns,
            bounds: self.bounds,
            seed: series_seed,
            parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bounds() {
        let bounds = TurnBounds::standard();
        assert!(bounds.check(10).is_ok());
        assert!(bounds.check(599).is_ok());
        assert_eq!(
            bounds.check(9),
            Err(EngineError::TurnCountOutOfRange { turns: 9, min: 10, max: 599 })
        );
        assert!(bounds.check(600).is_err());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(TurnBounds::new(0, 10).is_err());
        assert!(TurnBounds::new(20, 10).is_err());
        assert!(TurnBounds::new(5, 5).is_ok());
    }

    #[test]
    fn test_with_min_keeps_standard_max() {
        let bounds = TurnBounds::with_min(1).unwrap();
        assert!(bounds.check(1).is_ok());
        assert!(bounds.check(5).is_ok());
        assert!(bounds.check(600).is_err());
        assert_eq!(TurnBounds::with_min(TurnBounds::STANDARD_MIN).unwrap(), TurnBounds::standard());
        assert!(TurnBounds::with_min(0).is_err());
        assert!(TurnBounds::with_min(600).is_err());
    }

    #[test]
    fn test_series_config_defaults() {
        let config = SeriesConfig::default();
        assert_eq!(config.samples, 10);
        assert_eq!(config.turns, 100);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert_eq!(SeriesConfig::new(0, 100).validate(), Err(EngineError::ZeroSamples));
        assert_eq!(TournamentConfig::new(0, 100).validate(), Err(EngineError::ZeroSamples));
    }

    #[test]
    fn test_tournament_config_from_partial_json() {
        let config: TournamentConfig =
            serde_json::from_str(r#"{"samples": 5, "seed": 9}"#).unwrap();
        assert_eq!(config.samples, 5);
        assert_eq!(config.seed, 9);
        assert_eq!(config.turns, 200);
        assert_eq!(config.bounds, TurnBounds::standard());
    }

    #[test]
    fn test_series_config_inherits_tournament_params() {
        let config = TournamentConfig::new(3, 40).with_parallel(true);
        let series = config.series_config(77);
        assert_eq!(series.samples, 3);
        assert_eq!(series.turns, 40);
        assert_eq!(series.seed, 77);
        assert!(!series.parallel);
    }
}
