//! Error taxonomy for the scoring pipeline.
//!
//! Lexicon failures are fatal for a run. Collocation failures are degraded to
//! an empty table for the affected document (see `collocation::fetch_collocations`),
//! so the same variants appear both as hard errors and as recorded failures.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SentimentError {
    /// A lexicon or statistics source could not be reached.
    #[error("{what} unavailable: {reason}")]
    DataUnavailable { what: String, reason: String },

    /// Caller-supplied data is unusable (missing `urn` column, empty keywords, ...).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A response arrived but did not have the expected shape.
    #[error("could not decode {what}: {reason}")]
    Decode { what: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SentimentError>;

impl SentimentError {
    pub fn unavailable(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable tag, used in logs and JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::MalformedInput(_) => "malformed_input",
            Self::Decode { .. } => "decode_error",
        }
    }
}
