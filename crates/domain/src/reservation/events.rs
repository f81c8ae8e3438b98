//! Reservation domain events.

use chrono::{DateTime, Utc};
use common::ReservationId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::ReservationStatus;

/// Events published by the reservation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReservationEvent {
    ReservationCreated(ReservationCreatedData),
    ReservationConfirmed(ReservationTransitionData),
    ReservationCompleted(ReservationTransitionData),
    ReservationNoShow(ReservationTransitionData),
    ReservationCancelled(ReservationCancelledData),
    ReservationRescheduled(ReservationRescheduledData),
}

impl DomainEvent for ReservationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::ReservationCreated(_) => "ReservationCreated",
            ReservationEvent::ReservationConfirmed(_) => "ReservationConfirmed",
            ReservationEvent::ReservationCompleted(_) => "ReservationCompleted",
            ReservationEvent::ReservationNoShow(_) => "ReservationNoShow",
            ReservationEvent::ReservationCancelled(_) => "ReservationCancelled",
            ReservationEvent::ReservationRescheduled(_) => "ReservationRescheduled",
        }
    }

    fn aggregate_id(&self) -> String {
        let id = match self {
            ReservationEvent::ReservationCreated(d) => &d.reservation_id,
            ReservationEvent::ReservationConfirmed(d)
            | ReservationEvent::ReservationCompleted(d)
            | ReservationEvent::ReservationNoShow(d) => &d.reservation_id,
            ReservationEvent::ReservationCancelled(d) => &d.reservation_id,
            ReservationEvent::ReservationRescheduled(d) => &d.reservation_id,
        };
        id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCreatedData {
    pub reservation_id: ReservationId,
    pub customer_id: String,
    pub table_id: String,
    pub date_time: DateTime<Utc>,
    pub party_size: i32,
}

/// Payload shared by the plain status changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationTransitionData {
    pub reservation_id: ReservationId,
    pub old_status: ReservationStatus,
    pub new_status: ReservationStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCancelledData {
    pub reservation_id: ReservationId,
    pub previous_status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRescheduledData {
    pub reservation_id: ReservationId,
    pub old_date_time: DateTime<Utc>,
    pub new_date_time: DateTime<Utc>,
}
