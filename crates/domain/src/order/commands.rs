//! Order command inputs and query filters.

use serde::{Deserialize, Serialize};

use super::{NewOrderItem, OrderStatus, OrderType};

/// Input for opening an order, optionally with its first lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub customer_id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

impl CreateOrder {
    pub fn new(customer_id: impl Into<String>, order_type: OrderType) -> Self {
        Self {
            customer_id: customer_id.into(),
            order_type,
            table_id: None,
            delivery_address: None,
            notes: None,
            items: Vec::new(),
        }
    }

    pub fn table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn delivery_address(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    pub fn item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }
}

/// Filters for listing orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub customer_id: Option<String>,
    pub table_id: Option<String>,
}
