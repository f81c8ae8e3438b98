//! Kitchen ticket aggregate.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{KitchenItemId, KitchenOrderId, OrderId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::events::{
    KitchenItemStatusChangedData, KitchenOrderCompletedData, KitchenOrderCreatedData,
    KitchenOrderStatusChangedData,
};
use super::{
    KitchenError, KitchenEvent, KitchenItem, KitchenItemStatus, KitchenOrderStatus,
    NewKitchenItem, Priority,
};

/// Kitchen ticket for one paid order.
///
/// The ticket status follows its items: every item status change runs a
/// rollup over the children. `estimatedTime` is the longest prep time of
/// the items still being worked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrder {
    id: KitchenOrderId,

    #[serde(default)]
    version: Version,

    order_id: OrderId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_id: Option<String>,

    status: KitchenOrderStatus,

    items: Vec<KitchenItem>,

    #[serde(default)]
    priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_station: Option<String>,

    #[serde(with = "common::serde_secs")]
    estimated_time: Duration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    notes: String,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for KitchenOrder {
    type Id = KitchenOrderId;
    type Event = KitchenEvent;
    type Error = KitchenError;

    fn aggregate_type() -> &'static str {
        "KitchenOrder"
    }

    fn id(&self) -> &KitchenOrderId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Queries
impl KitchenOrder {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn table_id(&self) -> Option<&str> {
        self.table_id.as_deref()
    }

    pub fn status(&self) -> KitchenOrderStatus {
        self.status
    }

    pub fn items(&self) -> &[KitchenItem] {
        &self.items
    }

    pub fn get_item(&self, item_id: &KitchenItemId) -> Option<&KitchenItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn assigned_station(&self) -> Option<&str> {
        self.assigned_station.as_deref()
    }

    pub fn estimated_time(&self) -> Duration {
        self.estimated_time
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Time spent cooking: start to completion, or start to `now` while
    /// still open. Zero before the ticket starts.
    pub fn time_elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.completed_at.unwrap_or(now);
        (end - started).to_std().unwrap_or(Duration::ZERO)
    }

    /// Estimated time left; zero once the ticket is ready or closed.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.status.is_done() {
            return Duration::ZERO;
        }
        self.estimated_time.saturating_sub(self.time_elapsed(now))
    }
}

// Command methods
impl KitchenOrder {
    /// Opens a ticket for `order_id`.
    pub fn create(
        order_id: OrderId,
        table_id: Option<String>,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<KitchenEvent>), KitchenError> {
        if order_id.is_empty() {
            return Err(KitchenError::MissingOrderId);
        }

        let ticket = Self {
            id: KitchenOrderId::generate(),
            version: Version::initial(),
            order_id,
            table_id: table_id.filter(|t| !t.trim().is_empty()),
            status: KitchenOrderStatus::New,
            items: Vec::new(),
            priority,
            assigned_station: None,
            estimated_time: Duration::ZERO,
            started_at: None,
            completed_at: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };

        let event = KitchenEvent::KitchenOrderCreated(KitchenOrderCreatedData {
            kitchen_order_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            priority,
            item_count: 0,
            created_at: now,
        });
        Ok((ticket, vec![event]))
    }

    fn ensure_modifiable(&self) -> Result<(), KitchenError> {
        if !self.status.can_modify_items() {
            return Err(KitchenError::NotModifiable {
                status: self.status,
            });
        }
        Ok(())
    }

    fn recalculate_estimated_time(&mut self) {
        self.estimated_time = self
            .items
            .iter()
            .filter(|i| i.is_pending())
            .map(|i| i.prep_time)
            .max()
            .unwrap_or(Duration::ZERO);
    }

    fn status_changed(
        &self,
        old_status: KitchenOrderStatus,
        now: DateTime<Utc>,
    ) -> KitchenEvent {
        KitchenEvent::KitchenOrderStatusChanged(KitchenOrderStatusChangedData {
            kitchen_order_id: self.id.clone(),
            order_id: self.order_id.clone(),
            old_status,
            new_status: self.status,
            changed_at: now,
        })
    }

    fn set_status(&mut self, next: KitchenOrderStatus, now: DateTime<Utc>) {
        self.status = next;
        match next {
            KitchenOrderStatus::Preparing if self.started_at.is_none() => {
                self.started_at = Some(now)
            }
            KitchenOrderStatus::Completed => self.completed_at = Some(now),
            _ => {}
        }
    }

    /// Derives the ticket status from its items.
    ///
    /// All cancelled wins over all ready; a closed ticket never moves.
    fn rollup(&mut self, now: DateTime<Utc>) -> Option<KitchenEvent> {
        if self.items.is_empty() || self.status.is_terminal() {
            return None;
        }

        let all_cancelled = self
            .items
            .iter()
            .all(|i| i.status == KitchenItemStatus::Cancelled);
        let all_ready = self
            .items
            .iter()
            .filter(|i| i.status != KitchenItemStatus::Cancelled)
            .all(|i| i.status == KitchenItemStatus::Ready);
        let any_preparing = self
            .items
            .iter()
            .any(|i| i.status == KitchenItemStatus::Preparing);

        let next = if all_cancelled {
            KitchenOrderStatus::Cancelled
        } else if all_ready {
            KitchenOrderStatus::Ready
        } else if any_preparing {
            KitchenOrderStatus::Preparing
        } else {
            return None;
        };

        if next == self.status {
            return None;
        }

        let previous = self.status;
        self.set_status(next, now);
        Some(self.status_changed(previous, now))
    }

    /// Appends a line; returns its id.
    pub fn add_item(
        &mut self,
        item: NewKitchenItem,
        now: DateTime<Utc>,
    ) -> Result<KitchenItemId, KitchenError> {
        self.ensure_modifiable()?;
        let line = KitchenItem::from_new(item)?;
        let id = line.id.clone();

        self.items.push(line);
        self.recalculate_estimated_time();
        self.updated_at = now;
        Ok(id)
    }

    /// Drops a line; the remaining items may settle the ticket.
    pub fn remove_item(
        &mut self,
        item_id: &KitchenItemId,
        now: DateTime<Utc>,
    ) -> Result<Vec<KitchenEvent>, KitchenError> {
        self.ensure_modifiable()?;
        let index = self
            .items
            .iter()
            .position(|i| &i.id == item_id)
            .ok_or_else(|| KitchenError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;

        self.items.remove(index);
        self.recalculate_estimated_time();
        self.updated_at = now;
        Ok(self.rollup(now).into_iter().collect())
    }

    /// Moves one item and rolls the change up to the ticket.
    pub fn update_item_status(
        &mut self,
        item_id: &KitchenItemId,
        next: KitchenItemStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<KitchenEvent>, KitchenError> {
        if self.status.is_terminal() {
            return Err(KitchenError::NotModifiable {
                status: self.status,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| KitchenError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;
        let previous = item.transition(next, now)?;

        self.recalculate_estimated_time();
        self.updated_at = now;

        let mut events = vec![KitchenEvent::KitchenItemStatusChanged(
            KitchenItemStatusChangedData {
                kitchen_order_id: self.id.clone(),
                item_id: item_id.clone(),
                old_status: previous,
                new_status: next,
                changed_at: now,
            },
        )];
        events.extend(self.rollup(now));
        Ok(events)
    }

    /// Starts every item that has not started yet.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Vec<KitchenEvent>, KitchenError> {
        if self.status != KitchenOrderStatus::New {
            return Err(KitchenError::InvalidStatusTransition {
                from: self.status,
                to: KitchenOrderStatus::Preparing,
            });
        }
        if self.items.is_empty() {
            return Err(KitchenError::NoItems);
        }

        let pending: Vec<KitchenItemId> = self
            .items
            .iter()
            .filter(|i| i.status == KitchenItemStatus::New)
            .map(|i| i.id.clone())
            .collect();

        let mut events = Vec::new();
        for item_id in &pending {
            events.extend(self.update_item_status(item_id, KitchenItemStatus::Preparing, now)?);
        }
        Ok(events)
    }

    /// Hands a ready ticket over.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Vec<KitchenEvent>, KitchenError> {
        if !self.status.can_transition_to(KitchenOrderStatus::Completed) {
            return Err(KitchenError::InvalidStatusTransition {
                from: self.status,
                to: KitchenOrderStatus::Completed,
            });
        }

        let previous = self.status;
        self.set_status(KitchenOrderStatus::Completed, now);
        self.updated_at = now;

        Ok(vec![
            self.status_changed(previous, now),
            KitchenEvent::KitchenOrderCompleted(KitchenOrderCompletedData {
                kitchen_order_id: self.id.clone(),
                order_id: self.order_id.clone(),
                completed_at: now,
            }),
        ])
    }

    /// Cancels the ticket; items already READY keep their state.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Vec<KitchenEvent>, KitchenError> {
        if !self.status.can_transition_to(KitchenOrderStatus::Cancelled) {
            return Err(KitchenError::InvalidStatusTransition {
                from: self.status,
                to: KitchenOrderStatus::Cancelled,
            });
        }

        for item in self.items.iter_mut().filter(|i| i.is_pending()) {
            item.status = KitchenItemStatus::Cancelled;
        }

        let previous = self.status;
        self.set_status(KitchenOrderStatus::Cancelled, now);
        self.recalculate_estimated_time();
        self.updated_at = now;

        Ok(vec![self.status_changed(previous, now)])
    }

    /// Moves the ticket to `next`; item-driven states go through the items.
    pub fn update_status(
        &mut self,
        next: KitchenOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<KitchenEvent>, KitchenError> {
        match next {
            KitchenOrderStatus::Preparing => self.start(now),
            KitchenOrderStatus::Completed => self.complete(now),
            KitchenOrderStatus::Cancelled => self.cancel(now),
            _ => Err(KitchenError::InvalidStatusTransition {
                from: self.status,
                to: next,
            }),
        }
    }

    pub fn set_priority(
        &mut self,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<(), KitchenError> {
        if self.status.is_terminal() {
            return Err(KitchenError::NotModifiable {
                status: self.status,
            });
        }
        self.priority = priority;
        self.updated_at = now;
        Ok(())
    }

    /// Assigns the ticket, and its unassigned items, to a station.
    pub fn assign_station(
        &mut self,
        station: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), KitchenError> {
        let station = station.into();
        if station.trim().is_empty() {
            return Err(KitchenError::EmptyStation);
        }
        if self.status.is_terminal() {
            return Err(KitchenError::NotModifiable {
                status: self.status,
            });
        }

        for item in self
            .items
            .iter_mut()
            .filter(|i| i.assigned_station.is_none())
        {
            item.assigned_station = Some(station.clone());
        }
        self.assigned_station = Some(station);
        self.updated_at = now;
        Ok(())
    }

    pub fn add_notes(&mut self, notes: &str, now: DateTime<Utc>) -> Result<(), KitchenError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(KitchenError::EmptyNotes);
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
}
