//! Kitchen command inputs and query filters.

use common::OrderId;
use serde::{Deserialize, Serialize};

use super::{KitchenOrderStatus, NewKitchenItem, Priority};

/// Input for opening a ticket with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKitchenOrder {
    pub order_id: OrderId,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<NewKitchenItem>,
}

impl CreateKitchenOrder {
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self {
            order_id: order_id.into(),
            table_id: None,
            priority: Priority::default(),
            notes: None,
            items: Vec::new(),
        }
    }

    pub fn table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn item(mut self, item: NewKitchenItem) -> Self {
        self.items.push(item);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrderFilter {
    pub status: Option<KitchenOrderStatus>,
    pub priority: Option<Priority>,
    pub station: Option<String>,
}
