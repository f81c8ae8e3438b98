use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::Context;
use tokio::sync::mpsc;

use crate::{BusError, EventEnvelope, EventPublisher, Result, Subscription};

struct Subscriber {
    sender: mpsc::UnboundedSender<EventEnvelope>,
    event_types: Option<HashSet<String>>,
}

impl Subscriber {
    fn wants(&self, event_type: &str) -> bool {
        self.event_types
            .as_ref()
            .is_none_or(|types| types.contains(event_type))
    }
}

#[derive(Default)]
struct Inner {
    subscribers: Mutex<Vec<Subscriber>>,
    // Only set on capturing buses.
    published: Option<Mutex<Vec<EventEnvelope>>>,
    closed: AtomicBool,
}

/// In-process event bus.
///
/// Every subscriber gets its own unbounded queue, so a slow consumer never
/// causes another to miss events. Delivery is at-least-once for live
/// subscribers; events published before a subscription exist are not
/// replayed to it.
///
/// [`InMemoryEventBus::new`] keeps nothing after fan-out. Use
/// [`InMemoryEventBus::with_capture`] to also record every published
/// envelope for later inspection.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    inner: Arc<Inner>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that also records everything it publishes.
    pub fn with_capture() -> Self {
        Self {
            inner: Arc::new(Inner {
                published: Some(Mutex::new(Vec::new())),
                ..Inner::default()
            }),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.published.is_some()
    }

    /// Subscribes to every event type.
    pub fn subscribe(&self) -> Subscription {
        self.register(None)
    }

    /// Subscribes to the given event types only.
    pub fn subscribe_to<I, S>(&self, event_types: I) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Some(event_types.into_iter().map(Into::into).collect()))
    }

    fn register(&self, event_types: Option<HashSet<String>>) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        if !self.is_closed() {
            self.inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Subscriber {
                    sender,
                    event_types: event_types.clone(),
                });
        }
        Subscription {
            receiver,
            event_types,
        }
    }

    /// Returns every event published so far, in order. Always empty unless
    /// the bus was built with [`InMemoryEventBus::with_capture`].
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.inner
            .published
            .as_ref()
            .map(|log| log.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Returns the published events of one type, in order.
    pub fn published_of(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Clears the published log.
    pub fn clear(&self) {
        if let Some(log) = &self.inner.published {
            log.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("closed", &self.is_closed())
            .field("capturing", &self.is_capturing())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, ctx: &Context, event: EventEnvelope) -> Result<()> {
        ctx.check()?;
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        // Fan-out and capture happen under the subscriber lock so every
        // subscriber observes the same order as the log.
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        subscribers.retain(|s| !s.sender.is_closed());
        let mut delivered = 0usize;
        for subscriber in subscribers.iter().filter(|s| s.wants(&event.event_type)) {
            if subscriber.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }

        tracing::debug!(
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            delivered,
            "event published"
        );
        if let Some(log) = &self.inner.published {
            log.lock().unwrap_or_else(PoisonError::into_inner).push(event);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.inner.closed.store(true, Ordering::Release);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("event bus closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, aggregate_id: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .event_type(event_type)
            .aggregate_id(aggregate_id)
            .data_raw(json!({}))
            .service("test")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn every_subscriber_receives_every_event() {
        let bus = InMemoryEventBus::with_capture();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        let ctx = Context::background();

        bus.publish(&ctx, event("OrderPaid", "ord_1")).await.unwrap();
        bus.publish(&ctx, event("OrderCancelled", "ord_2"))
            .await
            .unwrap();

        for sub in [&mut first, &mut second] {
            assert_eq!(sub.recv().await.unwrap().aggregate_id, "ord_1");
            assert_eq!(sub.recv().await.unwrap().aggregate_id, "ord_2");
        }
        assert_eq!(bus.published().len(), 2);
    }

    #[tokio::test]
    async fn filtered_subscription_only_sees_its_types() {
        let bus = InMemoryEventBus::new();
        let mut paid_only = bus.subscribe_to(["OrderPaid"]);
        let ctx = Context::background();

        bus.publish(&ctx, event("OrderCreated", "ord_1"))
            .await
            .unwrap();
        bus.publish(&ctx, event("OrderPaid", "ord_1")).await.unwrap();

        let received = paid_only.recv().await.unwrap();
        assert_eq!(received.event_type, "OrderPaid");
        assert!(paid_only.try_recv().is_none());
    }

    #[tokio::test]
    async fn publish_after_close_fails_and_subscribers_end() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe();
        let ctx = Context::background();

        bus.publish(&ctx, event("OrderPaid", "ord_1")).await.unwrap();
        bus.close().await.unwrap();

        assert!(matches!(
            bus.publish(&ctx, event("OrderPaid", "ord_2")).await,
            Err(BusError::Closed)
        ));
        assert_eq!(sub.recv().await.unwrap().aggregate_id, "ord_1");
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn publish_honors_cancelled_context() {
        let bus = InMemoryEventBus::with_capture();
        let ctx = Context::background();
        ctx.cancel();

        let result = bus.publish(&ctx, event("OrderPaid", "ord_1")).await;
        assert!(matches!(result, Err(BusError::Interrupted(_))));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn default_bus_delivers_without_recording() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe();
        let ctx = Context::background();
        assert!(!bus.is_capturing());

        for i in 0..3 {
            bus.publish(&ctx, event("OrderPaid", &format!("ord_{i}")))
                .await
                .unwrap();
        }

        assert!(bus.published().is_empty());
        assert!(bus.published_of("OrderPaid").is_empty());
        for i in 0..3 {
            assert_eq!(sub.recv().await.unwrap().aggregate_id, format!("ord_{i}"));
        }
    }

    #[tokio::test]
    async fn capturing_bus_records_in_publish_order() {
        let bus = InMemoryEventBus::with_capture();
        let ctx = Context::background();
        assert!(bus.is_capturing());

        bus.publish(&ctx, event("OrderCreated", "ord_1"))
            .await
            .unwrap();
        bus.publish(&ctx, event("OrderPaid", "ord_1")).await.unwrap();

        let types: Vec<_> = bus.published().into_iter().map(|e| e.event_type).collect();
        assert_eq!(types, ["OrderCreated", "OrderPaid"]);
        assert_eq!(bus.published_of("OrderPaid").len(), 1);

        bus.clear();
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_pruned() {
        let bus = InMemoryEventBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);

        bus.publish(&Context::background(), event("OrderPaid", "ord_1"))
            .await
            .unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_publishers_are_safe() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe();
        let mut handles = Vec::new();
        for i in 0..16 {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                bus.publish(&Context::background(), event("OrderPaid", &format!("ord_{i}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut received = 0;
        while sub.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, 16);
    }
}
