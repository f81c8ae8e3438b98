//! Event processor feeding bus events to handlers.

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{Classify, Context};
use event_bus::{EventEnvelope, InMemoryEventBus, Subscription};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::handler::{EventHandler, Outcome};

/// Dispatches events to the handlers registered for their type.
///
/// A handler error never stops the processor: it is logged at warning
/// level, counted, and the event is dropped for that handler.
#[derive(Clone, Default)]
pub struct EventProcessor {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler with this processor.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Union of every handler's event types.
    pub fn event_types(&self) -> BTreeSet<&'static str> {
        self.handlers
            .iter()
            .flat_map(|h| h.event_types().iter().copied())
            .collect()
    }

    /// Delivers one event to each interested handler. Returns how many
    /// handlers applied a change.
    #[tracing::instrument(
        skip(self, ctx, event),
        fields(event_type = %event.event_type, aggregate_id = %event.aggregate_id)
    )]
    pub async fn process_event(&self, ctx: &Context, event: &EventEnvelope) -> usize {
        let mut applied = 0;
        for handler in &self.handlers {
            if !handler.event_types().contains(&event.event_type.as_str()) {
                continue;
            }

            match handler.handle(ctx, event).await {
                Ok(outcome) => {
                    if outcome == Outcome::Applied {
                        applied += 1;
                    }
                    tracing::debug!(
                        handler = handler.name(),
                        outcome = outcome.as_str(),
                        "event handled"
                    );
                    metrics::counter!(
                        "consumer_events_handled_total",
                        "handler" => handler.name(),
                        "outcome" => outcome.as_str()
                    )
                    .increment(1);
                }
                Err(e) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        aggregate_id = %event.aggregate_id,
                        kind = ?e.kind(),
                        error = %e,
                        "dropping event"
                    );
                    metrics::counter!(
                        "consumer_events_dropped_total",
                        "handler" => handler.name()
                    )
                    .increment(1);
                }
            }
        }
        applied
    }

    /// Processes every event already buffered in `subscription` without
    /// waiting for more, including events the handlers publish while
    /// running. Returns how many events were processed.
    pub async fn drain(&self, ctx: &Context, subscription: &mut Subscription) -> usize {
        let mut processed = 0;
        while let Some(event) = subscription.try_recv() {
            self.process_event(ctx, &event).await;
            processed += 1;
        }
        processed
    }

    /// Runs until `shutdown` is cancelled or the bus closes.
    #[tracing::instrument(skip_all)]
    pub async fn run(self, mut subscription: Subscription, shutdown: CancellationToken) {
        let ctx = Context::with_token(shutdown.child_token());
        tracing::info!(handlers = self.handlers.len(), "event processor started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("event processor stopping: shutdown requested");
                    break;
                }
                next = subscription.recv() => match next {
                    Some(event) => {
                        self.process_event(&ctx, &event).await;
                    }
                    None => {
                        tracing::info!("event processor stopping: bus closed");
                        break;
                    }
                },
            }
        }
    }

    /// Subscribes to the handlers' event types and runs on a new task.
    pub fn spawn(self, bus: &InMemoryEventBus, shutdown: CancellationToken) -> JoinHandle<()> {
        let subscription = bus.subscribe_to(self.event_types());
        tokio::spawn(self.run(subscription, shutdown))
    }
}

impl std::fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("EventProcessor")
            .field("handlers", &names)
            .finish()
    }
}
