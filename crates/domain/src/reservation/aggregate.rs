//! Reservation aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use common::{MenuItemId, ReservationId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::events::{
    ReservationCancelledData, ReservationCreatedData, ReservationRescheduledData,
    ReservationTransitionData,
};
use super::{ReservationError, ReservationEvent, ReservationStatus};

/// How long a reservation holds its table. Per-reservation durations are
/// not recorded.
pub const OCCUPANCY: Duration = Duration::hours(2);

/// A table booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: ReservationId,

    #[serde(default)]
    version: Version,

    customer_id: String,

    table_id: String,

    date_time: DateTime<Utc>,

    party_size: i32,

    status: ReservationStatus,

    #[serde(default)]
    notes: String,

    /// Kitchen notices keyed by menu item, e.g. a dish that is off.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    advisories: BTreeMap<MenuItemId, String>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for Reservation {
    type Id = ReservationId;
    type Event = ReservationEvent;
    type Error = ReservationError;

    fn aggregate_type() -> &'static str {
        "Reservation"
    }

    fn id(&self) -> &ReservationId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Reservation {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn date_time(&self) -> DateTime<Utc> {
        self.date_time
    }

    /// End of the table hold.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.date_time + OCCUPANCY
    }

    pub fn party_size(&self) -> i32 {
        self.party_size
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn advisories(&self) -> &BTreeMap<MenuItemId, String> {
        &self.advisories
    }

    pub fn advisory(&self, menu_item_id: &MenuItemId) -> Option<&str> {
        self.advisories.get(menu_item_id).map(String::as_str)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if this reservation holds its table during any part of
    /// `(start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status.blocks_table() && self.date_time < end && self.end_time() > start
    }
}

fn validate_party_size(party_size: i32) -> Result<(), ReservationError> {
    if party_size < 1 {
        return Err(ReservationError::InvalidPartySize { party_size });
    }
    Ok(())
}

fn validate_future(date_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ReservationError> {
    if date_time <= now {
        return Err(ReservationError::PastDateTime { date_time });
    }
    Ok(())
}

impl Reservation {
    pub fn create(
        customer_id: impl Into<String>,
        table_id: impl Into<String>,
        date_time: DateTime<Utc>,
        party_size: i32,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<ReservationEvent>), ReservationError> {
        let customer_id = customer_id.into();
        let table_id = table_id.into();
        if customer_id.trim().is_empty() {
            return Err(ReservationError::MissingCustomer);
        }
        if table_id.trim().is_empty() {
            return Err(ReservationError::MissingTable);
        }
        validate_party_size(party_size)?;
        validate_future(date_time, now)?;

        let reservation = Self {
            id: ReservationId::generate(),
            version: Version::initial(),
            customer_id,
            table_id,
            date_time,
            party_size,
            status: ReservationStatus::Pending,
            notes: String::new(),
            advisories: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };

        let event = ReservationEvent::ReservationCreated(ReservationCreatedData {
            reservation_id: reservation.id.clone(),
            customer_id: reservation.customer_id.clone(),
            table_id: reservation.table_id.clone(),
            date_time,
            party_size,
        });
        Ok((reservation, vec![event]))
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), ReservationError> {
        if !self.status.is_open() {
            return Err(ReservationError::InvalidState {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        action: &'static str,
        next: ReservationStatus,
        now: DateTime<Utc>,
    ) -> Result<ReservationTransitionData, ReservationError> {
        if !self.status.can_transition_to(next) {
            return Err(ReservationError::InvalidState {
                action,
                status: self.status,
            });
        }

        let old_status = self.status;
        self.status = next;
        self.updated_at = now;
        Ok(ReservationTransitionData {
            reservation_id: self.id.clone(),
            old_status,
            new_status: next,
            changed_at: now,
        })
    }

    pub fn confirm(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReservationEvent>, ReservationError> {
        let data = self.transition("confirm", ReservationStatus::Confirmed, now)?;
        Ok(vec![ReservationEvent::ReservationConfirmed(data)])
    }

    /// Seats the party and closes the booking.
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReservationEvent>, ReservationError> {
        let data = self.transition("complete", ReservationStatus::Completed, now)?;
        Ok(vec![ReservationEvent::ReservationCompleted(data)])
    }

    pub fn mark_no_show(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReservationEvent>, ReservationError> {
        let data = self.transition("mark as no-show", ReservationStatus::NoShow, now)?;
        Ok(vec![ReservationEvent::ReservationNoShow(data)])
    }

    pub fn cancel(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReservationEvent>, ReservationError> {
        let data = self.transition("cancel", ReservationStatus::Cancelled, now)?;
        Ok(vec![ReservationEvent::ReservationCancelled(
            ReservationCancelledData {
                reservation_id: data.reservation_id,
                previous_status: data.old_status,
                reason,
                cancelled_at: now,
            },
        )])
    }

    /// Moves the booking; the new time must be in the future.
    pub fn update_date_time(
        &mut self,
        date_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReservationEvent>, ReservationError> {
        validate_future(date_time, now)?;
        self.ensure_open("reschedule")?;
        if date_time == self.date_time {
            return Ok(Vec::new());
        }

        let old_date_time = self.date_time;
        self.date_time = date_time;
        self.updated_at = now;
        Ok(vec![ReservationEvent::ReservationRescheduled(
            ReservationRescheduledData {
                reservation_id: self.id.clone(),
                old_date_time,
                new_date_time: date_time,
            },
        )])
    }

    pub fn update_party_size(
        &mut self,
        party_size: i32,
        now: DateTime<Utc>,
    ) -> Result<(), ReservationError> {
        validate_party_size(party_size)?;
        self.ensure_open("resize")?;
        self.party_size = party_size;
        self.updated_at = now;
        Ok(())
    }

    pub fn update_table(
        &mut self,
        table_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ReservationError> {
        let table_id = table_id.into();
        if table_id.trim().is_empty() {
            return Err(ReservationError::MissingTable);
        }
        self.ensure_open("move")?;
        self.table_id = table_id;
        self.updated_at = now;
        Ok(())
    }

    pub fn add_notes(&mut self, notes: &str, now: DateTime<Utc>) -> Result<(), ReservationError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(ReservationError::EmptyNotes);
        }

        if self.notes.is_empty() {
            self.notes = notes.to_string();
        } else {
            self.notes.push('\n');
            self.notes.push_str(notes);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Sets or clears the advisory for one menu item. Returns whether
    /// anything changed; closed reservations are left alone.
    pub fn set_advisory(
        &mut self,
        menu_item_id: &MenuItemId,
        advisory: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.status.is_open() {
            return false;
        }

        let changed = match advisory {
            Some(text) => {
                if self.advisory(menu_item_id) == Some(text.as_str()) {
                    false
                } else {
                    self.advisories.insert(menu_item_id.clone(), text);
                    true
                }
            }
            None => self.advisories.remove(menu_item_id).is_some(),
        };
        if changed {
            self.updated_at = now;
        }
        changed
    }
}
