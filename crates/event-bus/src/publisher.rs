use std::collections::HashSet;

use async_trait::async_trait;
use common::Context;
use tokio::sync::mpsc;

use crate::{EventEnvelope, Result};

/// Publishes domain events.
///
/// Implementations must be safe for concurrent use; a single publisher is
/// shared by every service in the process.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event. Honors cancellation of `ctx`.
    async fn publish(&self, ctx: &Context, event: EventEnvelope) -> Result<()>;

    /// Stops accepting events and releases subscribers.
    async fn close(&self) -> Result<()>;
}

/// Receiving end of a bus subscription.
///
/// Yields events in publication order. Returns `None` once the bus is
/// closed and every buffered event has been drained.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) receiver: mpsc::UnboundedReceiver<EventEnvelope>,
    pub(crate) event_types: Option<HashSet<String>>,
}

impl Subscription {
    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        self.receiver.recv().await
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<EventEnvelope> {
        self.receiver.try_recv().ok()
    }

    /// Returns the event types this subscription is filtered on, if any.
    pub fn event_types(&self) -> Option<&HashSet<String>> {
        self.event_types.as_ref()
    }
}
