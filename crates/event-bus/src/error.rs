use common::{Classify, ErrorKind, Interrupted};
use thiserror::Error;

/// Errors raised while publishing or consuming domain events.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus has been closed and no longer accepts events.
    #[error("event bus is closed")]
    Closed,

    /// The envelope is missing a required field.
    #[error("invalid event envelope: missing {0}")]
    InvalidEnvelope(&'static str),

    /// The caller's context was cancelled or timed out.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    /// Payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport specific failure.
    #[error("publish failed: {0}")]
    Transport(String),
}

impl Classify for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
