//! Lines of a kitchen ticket.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{KitchenItemId, MenuItemId};
use serde::{Deserialize, Serialize};

use super::{KitchenError, KitchenItemStatus};

/// One dish to prepare.
///
/// `startedAt` is set on entry to PREPARING and `completedAt` on entry to
/// READY; callers never set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenItem {
    pub(crate) id: KitchenItemId,
    pub(crate) menu_item_id: MenuItemId,
    pub(crate) name: String,
    pub(crate) quantity: i32,
    pub(crate) status: KitchenItemStatus,
    #[serde(with = "common::serde_secs")]
    pub(crate) prep_time: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) assigned_station: Option<String>,
    #[serde(default)]
    pub(crate) notes: String,
    #[serde(default)]
    pub(crate) modifications: Vec<String>,
}

impl KitchenItem {
    pub(crate) fn from_new(item: NewKitchenItem) -> Result<Self, KitchenError> {
        item.validate()?;
        Ok(Self {
            id: KitchenItemId::generate(),
            menu_item_id: item.menu_item_id,
            name: item.name,
            quantity: item.quantity,
            status: KitchenItemStatus::New,
            prep_time: item.prep_time,
            started_at: None,
            completed_at: None,
            assigned_station: None,
            notes: item.notes,
            modifications: item.modifications,
        })
    }

    /// Moves the item along its graph and stamps the timing fields.
    pub(crate) fn transition(
        &mut self,
        next: KitchenItemStatus,
        now: DateTime<Utc>,
    ) -> Result<KitchenItemStatus, KitchenError> {
        if !self.status.can_transition_to(next) {
            return Err(KitchenError::InvalidItemTransition {
                from: self.status,
                to: next,
            });
        }

        let previous = self.status;
        self.status = next;
        match next {
            KitchenItemStatus::Preparing => self.started_at = Some(now),
            KitchenItemStatus::Ready => self.completed_at = Some(now),
            _ => {}
        }
        Ok(previous)
    }

    /// Returns true while the item still needs cooking time.
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn id(&self) -> &KitchenItemId {
        &self.id
    }

    pub fn menu_item_id(&self) -> &MenuItemId {
        &self.menu_item_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn status(&self) -> KitchenItemStatus {
        self.status
    }

    pub fn prep_time(&self) -> Duration {
        self.prep_time
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn assigned_station(&self) -> Option<&str> {
        self.assigned_station.as_deref()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn modifications(&self) -> &[String] {
        &self.modifications
    }
}

/// Input for a new ticket line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKitchenItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: i32,
    #[serde(with = "common::serde_secs")]
    pub prep_time: Duration,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub modifications: Vec<String>,
}

impl NewKitchenItem {
    pub fn new(
        menu_item_id: impl Into<MenuItemId>,
        name: impl Into<String>,
        quantity: i32,
        prep_time: Duration,
    ) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            quantity,
            prep_time,
            notes: String::new(),
            modifications: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_modifications(mut self, modifications: Vec<String>) -> Self {
        self.modifications = modifications;
        self
    }

    fn validate(&self) -> Result<(), KitchenError> {
        if self.menu_item_id.is_empty() {
            return Err(KitchenError::MissingMenuItem);
        }
        if self.name.trim().is_empty() {
            return Err(KitchenError::MissingItemName);
        }
        if self.quantity < 1 {
            return Err(KitchenError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn soup() -> KitchenItem {
        KitchenItem::from_new(NewKitchenItem::new("m1", "Soup", 1, Duration::from_secs(300)))
            .unwrap()
    }

    #[test]
    fn transitions_stamp_times() {
        let t0 = Utc.with_ymd_and_hms(2025, 5, 10, 19, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 5, 10, 19, 5, 0).unwrap();
        let mut item = soup();

        item.transition(KitchenItemStatus::Preparing, t0).unwrap();
        item.transition(KitchenItemStatus::Ready, t1).unwrap();

        assert_eq!(item.started_at(), Some(t0));
        assert_eq!(item.completed_at(), Some(t1));
        assert!(!item.is_pending());
    }

    #[test]
    fn ready_items_cannot_be_cancelled() {
        let now = Utc::now();
        let mut item = soup();
        item.transition(KitchenItemStatus::Preparing, now).unwrap();
        item.transition(KitchenItemStatus::Ready, now).unwrap();

        let err = item.transition(KitchenItemStatus::Cancelled, now).unwrap_err();
        assert!(matches!(err, KitchenError::InvalidItemTransition { .. }));
        assert_eq!(item.status(), KitchenItemStatus::Ready);
    }

    #[test]
    fn rejects_invalid_lines() {
        let zero = NewKitchenItem::new("m1", "Soup", 0, Duration::ZERO);
        assert!(matches!(
            KitchenItem::from_new(zero),
            Err(KitchenError::InvalidQuantity { quantity: 0 })
        ));

        let unnamed = NewKitchenItem::new("m1", " ", 1, Duration::ZERO);
        assert!(matches!(
            KitchenItem::from_new(unnamed),
            Err(KitchenError::MissingItemName)
        ));
    }

    #[test]
    fn prep_time_serializes_as_seconds() {
        let json = serde_json::to_value(soup()).unwrap();
        assert_eq!(json["prepTime"], 300);
        assert_eq!(json["status"], "NEW");
        assert!(json.get("startedAt").is_none());
    }
}
