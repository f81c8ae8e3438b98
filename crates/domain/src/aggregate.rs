//! Core aggregate and domain event traits.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use common::{Classify, Version};
use event_bus::{EventEnvelope, metadata};
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events record facts that already happened; they are named in
/// past tense. Implementors are enums serialized with
/// `#[serde(tag = "type", content = "data")]` so that the variant name is
/// the stable event type and the variant payload is the envelope `data`.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {
    /// Returns the stable event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the textual id of the aggregate that emitted the event.
    fn aggregate_id(&self) -> String;

    /// Wraps the event in a wire envelope.
    fn to_envelope(
        &self,
        service: &str,
        version: Version,
        occurred_at: DateTime<Utc>,
    ) -> Result<EventEnvelope, event_bus::BusError> {
        let mut tagged = serde_json::to_value(self)?;
        let data = tagged
            .get_mut("data")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null);

        EventEnvelope::builder()
            .event_type(self.event_type())
            .aggregate_id(self.aggregate_id())
            .data_raw(data)
            .service(service)
            .metadata(metadata::AGGREGATE_VERSION, version.to_string())
            .occurred_at(occurred_at)
            .build()
    }

    /// Decodes a typed event from a wire envelope.
    fn from_envelope(envelope: &EventEnvelope) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": envelope.event_type,
            "data": envelope.data,
        }))
    }
}

/// Trait for aggregate roots.
///
/// An aggregate is mutated only through its own domain methods; those
/// methods enforce invariants, recompute derived fields and return the
/// events describing externally meaningful transitions. The repository
/// stores the whole aggregate and the [`Version`] guards concurrent writes.
pub trait Aggregate: Clone + Debug + Send + Sync + 'static {
    /// Identifier type of the root.
    type Id: Clone + Eq + Hash + Ord + Display + Debug + Send + Sync + 'static;

    /// The type of events this aggregate emits.
    type Event: DomainEvent;

    /// The type of errors its domain methods return.
    type Error: std::error::Error + Classify + Send + Sync + 'static;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the stored version; 0 until first persisted.
    fn version(&self) -> Version;

    /// Sets the version. Called by repositories after a successful write.
    fn set_version(&mut self, version: Version);
}
