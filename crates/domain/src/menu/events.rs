//! Menu domain events.

use chrono::{DateTime, Utc};
use common::{MenuId, MenuItemId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MenuEvent {
    MenuCreated(MenuCreatedData),
    MenuActivated(MenuActivationData),
    MenuDeactivated(MenuActivationData),
    ItemAvailabilityChanged(ItemAvailabilityChangedData),
}

impl DomainEvent for MenuEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MenuEvent::MenuCreated(_) => "MenuCreated",
            MenuEvent::MenuActivated(_) => "MenuActivated",
            MenuEvent::MenuDeactivated(_) => "MenuDeactivated",
            MenuEvent::ItemAvailabilityChanged(_) => "ItemAvailabilityChanged",
        }
    }

    fn aggregate_id(&self) -> String {
        let id = match self {
            MenuEvent::MenuCreated(d) => &d.menu_id,
            MenuEvent::MenuActivated(d) | MenuEvent::MenuDeactivated(d) => &d.menu_id,
            MenuEvent::ItemAvailabilityChanged(d) => &d.menu_id,
        };
        id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCreatedData {
    pub menu_id: MenuId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuActivationData {
    pub menu_id: MenuId,
    pub revision: u64,
    pub changed_at: DateTime<Utc>,
}

/// A dish went on or off; reservations annotate upcoming bookings with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAvailabilityChangedData {
    pub menu_id: MenuId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub is_available: bool,
    pub changed_at: DateTime<Utc>,
}
