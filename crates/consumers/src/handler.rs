//! Core handler trait.

use async_trait::async_trait;
use common::Context;
use event_bus::EventEnvelope;
use serde::de::DeserializeOwned;

use crate::{ConsumerError, Result};

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target aggregate was changed.
    Applied,
    /// The target was already in the wanted state, or the event is
    /// informational for this handler.
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Applied => "applied",
            Outcome::Skipped => "skipped",
        }
    }
}

/// Reacts to events published by other services.
///
/// Implementations must be idempotent: their effect is a target-state
/// assignment on their own aggregate, never a delta.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns the handler name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// The event types this handler consumes.
    fn event_types(&self) -> &'static [&'static str];

    /// Applies one event.
    async fn handle(&self, ctx: &Context, event: &EventEnvelope) -> Result<Outcome>;
}

/// Decodes an envelope payload, tagging failures with the event type.
pub fn decode<T: DeserializeOwned>(event: &EventEnvelope) -> Result<T> {
    event
        .data_as()
        .map_err(|e| ConsumerError::decode(event.event_type.clone(), e))
}
