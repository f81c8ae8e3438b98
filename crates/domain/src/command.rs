//! Command handling infrastructure.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{Clock, Context, Version};
use event_bus::EventPublisher;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;
use crate::repository::Repository;

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate as persisted.
    pub aggregate: A,

    /// The events emitted by the mutation, in order.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the write.
    pub new_version: Version,
}

/// Runs load → mutate → persist → publish for one aggregate type.
///
/// Reads are abandoned as soon as the caller's context is cancelled. The
/// context is checked once more right before the write; once the write
/// starts it runs to completion and its events are published on a
/// detached context, so a persisted change is never silently unpublished
/// because the caller went away. Publication failures are logged and
/// counted but never returned.
pub struct CommandHandler<A: Aggregate, R: ?Sized> {
    repository: Arc<R>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    service: &'static str,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: Aggregate, R: ?Sized> Clone for CommandHandler<A, R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            publisher: Arc::clone(&self.publisher),
            clock: Arc::clone(&self.clock),
            service: self.service,
            _aggregate: PhantomData,
        }
    }
}

impl<A, R> CommandHandler<A, R>
where
    A: Aggregate,
    R: Repository<A> + ?Sized,
    DomainError: From<A::Error>,
{
    pub fn new(
        service: &'static str,
        repository: Arc<R>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            publisher,
            clock,
            service,
            _aggregate: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Loads an aggregate, honoring cancellation.
    pub async fn load(&self, ctx: &Context, id: &A::Id) -> Result<A, DomainError> {
        Ok(ctx.run(self.repository.get(id)).await??)
    }

    /// Persists a freshly constructed aggregate and publishes its events.
    pub async fn create(
        &self,
        ctx: &Context,
        mut aggregate: A,
        events: Vec<A::Event>,
    ) -> Result<CommandResult<A>, DomainError> {
        let started = Instant::now();
        ctx.check()?;

        let new_version = self.repository.insert(&aggregate).await?;
        aggregate.set_version(new_version);
        self.publish_all(ctx, &events, new_version).await;
        self.record_duration("create", started);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Loads an aggregate, applies `command_fn` and persists the result.
    ///
    /// `command_fn` receives the aggregate and the current time and returns
    /// the events its mutation emits. On error nothing is written.
    pub async fn execute<F>(
        &self,
        ctx: &Context,
        id: &A::Id,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&mut A, DateTime<Utc>) -> Result<Vec<A::Event>, A::Error> + Send,
    {
        let (result, ()) = self
            .execute_returning(ctx, id, |aggregate, now| {
                command_fn(aggregate, now).map(|events| ((), events))
            })
            .await?;
        Ok(result)
    }

    /// Like [`execute`](Self::execute), for domain methods that also hand
    /// back a value such as the id of a new child entity.
    pub async fn execute_returning<F, T>(
        &self,
        ctx: &Context,
        id: &A::Id,
        command_fn: F,
    ) -> Result<(CommandResult<A>, T), DomainError>
    where
        F: FnOnce(&mut A, DateTime<Utc>) -> Result<(T, Vec<A::Event>), A::Error> + Send,
        T: Send,
    {
        let started = Instant::now();
        let mut aggregate = self.load(ctx, id).await?;

        let (value, events) = command_fn(&mut aggregate, self.clock.now())?;

        ctx.check()?;
        let new_version = self.repository.update(&aggregate).await?;
        aggregate.set_version(new_version);
        self.publish_all(ctx, &events, new_version).await;
        self.record_duration("execute", started);

        let result = CommandResult {
            aggregate,
            events,
            new_version,
        };
        Ok((result, value))
    }

    /// Publishes events in order, logging failures instead of returning them.
    pub async fn publish_all(&self, ctx: &Context, events: &[A::Event], version: Version) {
        if events.is_empty() {
            return;
        }

        let detached = Context::background().with_request_id(ctx.request_id());
        let occurred_at = self.clock.now();

        for event in events {
            let envelope = match event.to_envelope(self.service, version, occurred_at) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(
                        event_type = event.event_type(),
                        aggregate_id = %event.aggregate_id(),
                        error = %e,
                        "failed to encode domain event"
                    );
                    metrics::counter!(
                        "domain_events_publish_failures_total",
                        "event_type" => event.event_type()
                    )
                    .increment(1);
                    continue;
                }
            };

            match self.publisher.publish(&detached, envelope).await {
                Ok(()) => {
                    metrics::counter!(
                        "domain_events_published_total",
                        "event_type" => event.event_type()
                    )
                    .increment(1);
                }
                Err(e) => {
                    tracing::warn!(
                        event_type = event.event_type(),
                        aggregate_id = %event.aggregate_id(),
                        error = %e,
                        "failed to publish domain event"
                    );
                    metrics::counter!(
                        "domain_events_publish_failures_total",
                        "event_type" => event.event_type()
                    )
                    .increment(1);
                }
            }
        }
    }

    fn record_duration(&self, operation: &'static str, started: Instant) {
        metrics::histogram!(
            "command_duration_seconds",
            "aggregate" => A::aggregate_type(),
            "operation" => operation
        )
        .record(started.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use crate::order::{OrderError, OrderStatus};
    use common::{Classify, ErrorKind, FixedClock, OrderId};
    use event_bus::{BusError, EventEnvelope, InMemoryEventBus};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type", content = "data")]
    enum CounterEvent {
        CounterBumped(BumpedData),
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct BumpedData {
        counter_id: OrderId,
        value: i32,
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            "CounterBumped"
        }

        fn aggregate_id(&self) -> String {
            match self {
                CounterEvent::CounterBumped(d) => d.counter_id.to_string(),
            }
        }
    }

    #[derive(Debug, Clone)]
    struct Counter {
        id: OrderId,
        value: i32,
        version: Version,
    }

    impl Aggregate for Counter {
        type Id = OrderId;
        type Event = CounterEvent;
        type Error = OrderError;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn id(&self) -> &OrderId {
            &self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }
    }

    impl Counter {
        fn bump(&mut self) -> Result<Vec<CounterEvent>, OrderError> {
            if self.value >= 3 {
                return Err(OrderError::NotModifiable {
                    status: OrderStatus::Completed,
                });
            }
            self.value += 1;
            Ok(vec![CounterEvent::CounterBumped(BumpedData {
                counter_id: self.id.clone(),
                value: self.value,
            })])
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _ctx: &Context, _event: EventEnvelope) -> event_bus::Result<()> {
            Err(BusError::Transport("broker unavailable".into()))
        }

        async fn close(&self) -> event_bus::Result<()> {
            Ok(())
        }
    }

    fn handler(
        publisher: Arc<dyn EventPublisher>,
    ) -> (CommandHandler<Counter, MemoryStore<Counter>>, MemoryStore<Counter>) {
        let store = MemoryStore::new();
        let handler = CommandHandler::new(
            "counter",
            Arc::new(store.clone()),
            publisher,
            Arc::new(FixedClock::new(Utc::now())),
        );
        (handler, store)
    }

    fn counter() -> Counter {
        Counter {
            id: OrderId::generate(),
            value: 0,
            version: Version::initial(),
        }
    }

    #[tokio::test]
    async fn create_then_execute_bumps_version_and_publishes() {
        let bus = InMemoryEventBus::with_capture();
        let (handler, _) = handler(Arc::new(bus.clone()));
        let ctx = Context::background();

        let created = handler.create(&ctx, counter(), vec![]).await.unwrap();
        assert_eq!(created.new_version, Version::first());

        let id = created.aggregate.id.clone();
        let result = handler
            .execute(&ctx, &id, |c, _| c.bump())
            .await
            .unwrap();

        assert_eq!(result.aggregate.value, 1);
        assert_eq!(result.new_version, Version::new(2));
        let published = bus.published_of("CounterBumped");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].aggregate_id, id.to_string());
        assert_eq!(published[0].service(), Some("counter"));
    }

    #[tokio::test]
    async fn rejected_command_writes_nothing() {
        let bus = InMemoryEventBus::with_capture();
        let (handler, store) = handler(Arc::new(bus.clone()));
        let ctx = Context::background();

        let mut frozen = counter();
        frozen.value = 3;
        let id = frozen.id.clone();
        handler.create(&ctx, frozen, vec![]).await.unwrap();

        let err = handler.execute(&ctx, &id, |c, _| c.bump()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(store.get(&id).await.unwrap().version, Version::first());
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_the_command() {
        let (handler, store) = handler(Arc::new(FailingPublisher));
        let ctx = Context::background();
        let created = handler.create(&ctx, counter(), vec![]).await.unwrap();
        let id = created.aggregate.id.clone();

        let result = handler.execute(&ctx, &id, |c, _| c.bump()).await.unwrap();
        assert_eq!(result.events.len(), 1);
        assert_eq!(store.get(&id).await.unwrap().value, 1);
    }

    #[tokio::test]
    async fn cancelled_context_aborts_before_write() {
        let bus = InMemoryEventBus::with_capture();
        let (handler, store) = handler(Arc::new(bus.clone()));
        let created = handler
            .create(&Context::background(), counter(), vec![])
            .await
            .unwrap();
        let id = created.aggregate.id.clone();

        let ctx = Context::background();
        ctx.cancel();
        let err = handler.execute(&ctx, &id, |c, _| c.bump()).await.unwrap_err();

        assert!(matches!(err, DomainError::Cancelled(_)));
        assert_eq!(store.get(&id).await.unwrap().value, 0);
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let bus = InMemoryEventBus::with_capture();
        let (handler, store) = handler(Arc::new(bus));
        let ctx = Context::background();
        let created = handler.create(&ctx, counter(), vec![]).await.unwrap();

        let stale = created.aggregate.clone();
        handler
            .execute(&ctx, &stale.id, |c, _| c.bump())
            .await
            .unwrap();

        let err = store.update(&stale).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn missing_aggregate_is_not_found() {
        let (handler, _) = handler(Arc::new(InMemoryEventBus::with_capture()));
        let err = handler
            .execute(&Context::background(), &OrderId::from("ord_missing"), |c, _| {
                c.bump()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
