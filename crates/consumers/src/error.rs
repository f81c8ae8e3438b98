//! Consumer error types.

use common::{Classify, ErrorKind};
use domain::DomainError;
use thiserror::Error;

/// Errors a handler can hit while applying an event.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The payload did not match the expected shape.
    #[error("cannot decode {event_type} payload: {source}")]
    Decode {
        event_type: String,
        #[source]
        source: event_bus::BusError,
    },

    /// The induced operation was rejected by the target service.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ConsumerError {
    pub fn decode(event_type: impl Into<String>, source: event_bus::BusError) -> Self {
        ConsumerError::Decode {
            event_type: event_type.into(),
            source,
        }
    }
}

impl Classify for ConsumerError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConsumerError::Decode { .. } => ErrorKind::Validation,
            ConsumerError::Domain(e) => e.kind(),
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ConsumerError::Decode { .. } => None,
            ConsumerError::Domain(e) => e.code(),
        }
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, ConsumerError>;
