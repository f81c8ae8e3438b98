use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{BusError, Result};

/// Well-known metadata keys.
pub mod metadata {
    /// Name of the emitting service.
    pub const SERVICE: &str = "service";
    /// Version of the aggregate once the transition was persisted.
    pub const AGGREGATE_VERSION: &str = "aggregateVersion";
    /// Request that caused the event, when known.
    pub const REQUEST_ID: &str = "requestId";
}

/// A domain event on the wire.
///
/// Serializes to the canonical shape
/// `{"type","aggregateId","data","metadata","occurredAt"}`; the `type`
/// string is part of the public contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// The stable event type, e.g. `OrderPaid`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Textual id of the aggregate that emitted the event.
    pub aggregate_id: String,

    /// Typed payload in JSON form.
    pub data: serde_json::Value,

    /// String metadata; always carries `service`.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Creates a new envelope builder.
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }

    /// Deserializes the payload into a typed struct.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Returns the emitting service, if recorded.
    pub fn service(&self) -> Option<&str> {
        self.metadata_value(metadata::SERVICE)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Builder for constructing event envelopes.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_type: Option<String>,
    aggregate_id: Option<String>,
    data: Option<serde_json::Value>,
    metadata: BTreeMap<String, String>,
    occurred_at: Option<DateTime<Utc>>,
}

impl EventEnvelopeBuilder {
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn aggregate_id(mut self, id: impl Into<String>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    /// Sets the payload from a serializable value.
    pub fn data<T: Serialize>(mut self, data: &T) -> Result<Self> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn data_raw(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn service(self, service: impl Into<String>) -> Self {
        self.metadata(metadata::SERVICE, service)
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the occurrence time. Defaults to now; sub-second precision is
    /// dropped so the RFC 3339 form is stable.
    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    /// Builds the envelope, failing if type, aggregate id or data is missing.
    pub fn build(self) -> Result<EventEnvelope> {
        let event_type = self
            .event_type
            .filter(|t| !t.is_empty())
            .ok_or(BusError::InvalidEnvelope("type"))?;
        let aggregate_id = self
            .aggregate_id
            .filter(|id| !id.is_empty())
            .ok_or(BusError::InvalidEnvelope("aggregateId"))?;
        let data = self.data.ok_or(BusError::InvalidEnvelope("data"))?;

        Ok(EventEnvelope {
            event_type,
            aggregate_id,
            data,
            metadata: self.metadata,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now).trunc_subsecs(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn envelope_has_canonical_json_shape() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap();
        let envelope = EventEnvelope::builder()
            .event_type("OrderPaid")
            .aggregate_id("ord_1")
            .data_raw(json!({"orderId": "ord_1"}))
            .service("order")
            .occurred_at(at)
            .build()
            .unwrap();

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "OrderPaid",
                "aggregateId": "ord_1",
                "data": {"orderId": "ord_1"},
                "metadata": {"service": "order"},
                "occurredAt": "2025-03-01T18:30:00Z"
            })
        );

        let back: EventEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(back, envelope);
        assert_eq!(back.service(), Some("order"));
    }

    #[test]
    fn build_rejects_missing_fields() {
        let err = EventEnvelope::builder().build().unwrap_err();
        assert!(matches!(err, BusError::InvalidEnvelope("type")));

        let err = EventEnvelope::builder()
            .event_type("OrderPaid")
            .aggregate_id("")
            .build()
            .unwrap_err();
        assert!(matches!(err, BusError::InvalidEnvelope("aggregateId")));
    }

    #[test]
    fn data_as_decodes_payload() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Paid {
            order_id: String,
        }

        let envelope = EventEnvelope::builder()
            .event_type("OrderPaid")
            .aggregate_id("ord_1")
            .data_raw(json!({"orderId": "ord_1", "extra": true}))
            .build()
            .unwrap();
        let paid: Paid = envelope.data_as().unwrap();
        assert_eq!(paid.order_id, "ord_1");
    }
}
