use std::time::Duration;

use nyaya_ai::GenerationError;
use thiserror::Error;

/// Failure of one advisor run. The process stays usable after any of these.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("corpus store unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("generation failed: {0}")]
    GenerationFailure(#[source] GenerationError),

    #[error("model did not answer within {}s", .0.as_secs_f64())]
    GenerationTimeout(Duration),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<GenerationError> for AdvisorError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Timeout(d) => Self::GenerationTimeout(d),
            GenerationError::Cancelled => Self::Cancelled,
            other => Self::GenerationFailure(other),
        }
    }
}
