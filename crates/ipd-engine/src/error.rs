//! Engine error type

use thiserror::Error;

/// Broad classification of an [`EngineError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input at construction time.
    Configuration,
    /// A result was requested before the producing step ran (or a step ran twice).
    Ordering,
    /// The engine broke one of its own bookkeeping invariants.
    Consistency,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error("turn count {turns} outside the valid range [{min}, {max}]")]
    TurnCountOutOfRange { turns: u32, min: u32, max: u32 },

    #[error("invalid turn bounds [{min}, {max}]")]
    InvalidTurnBounds { min: u32, max: u32 },

    #[error("sample count must be at least 1")]
    ZeroSamples,

    #[error("tournament roster is empty")]
    EmptyRoster,

    #[error("defect probability {0} outside [0, 1]")]
    InvalidProbability(f64),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("{stage} has not been run yet")]
    NotRun { stage: &'static str },

    #[error("{stage} has already been run")]
    AlreadyRun { stage: &'static str },

    #[error("series record {record:?} does not sum to sample count {samples}")]
    RecordMismatch { record: [u32; 3], samples: u32 },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::TurnCountOutOfRange { .. }
            | EngineError::InvalidTurnBounds { .. }
            | EngineError::ZeroSamples
            | EngineError::EmptyRoster
            | EngineError::InvalidProbability(_)
            | EngineError::UnknownStrategy(_) => ErrorKind::Configuration,
            EngineError::NotRun { .. } | EngineError::AlreadyRun { .. } => ErrorKind::Ordering,
            EngineError::RecordMismatch { .. } => ErrorKind::Consistency,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
