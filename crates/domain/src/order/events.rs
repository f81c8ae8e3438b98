//! Order domain events.

use chrono::{DateTime, Utc};
use common::{MenuItemId, OrderId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{OrderItem, OrderStatus, OrderType};

/// Events published by the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    OrderCreated(OrderCreatedData),

    /// Emitted on every status change, alongside any specific event.
    OrderStatusChanged(OrderStatusChangedData),

    OrderPaid(OrderPaidData),

    OrderCompleted(OrderCompletedData),

    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderStatusChanged(_) => "OrderStatusChanged",
            OrderEvent::OrderPaid(_) => "OrderPaid",
            OrderEvent::OrderCompleted(_) => "OrderCompleted",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }

    fn aggregate_id(&self) -> String {
        let id = match self {
            OrderEvent::OrderCreated(d) => &d.order_id,
            OrderEvent::OrderStatusChanged(d) => &d.order_id,
            OrderEvent::OrderPaid(d) => &d.order_id,
            OrderEvent::OrderCompleted(d) => &d.order_id,
            OrderEvent::OrderCancelled(d) => &d.order_id,
        };
        id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedData {
    pub order_id: OrderId,
    pub customer_id: String,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChangedData {
    pub order_id: OrderId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// Line of an `OrderPaid` payload; what the kitchen needs to cook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: i32,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl From<&OrderItem> for PaidItem {
    fn from(item: &OrderItem) -> Self {
        Self {
            menu_item_id: item.menu_item_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            modifications: item.modifications.clone(),
            notes: item.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaidData {
    pub order_id: OrderId,
    pub customer_id: String,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub total_amount: f64,
    pub items: Vec<PaidItem>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompletedData {
    pub order_id: OrderId,
    pub total_amount: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelledData {
    pub order_id: OrderId,
    pub previous_status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn status_changed(
        order_id: &OrderId,
        old_status: OrderStatus,
        new_status: OrderStatus,
        changed_at: DateTime<Utc>,
    ) -> Self {
        OrderEvent::OrderStatusChanged(OrderStatusChangedData {
            order_id: order_id.clone(),
            old_status,
            new_status,
            changed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Version;

    #[test]
    fn status_changed_wire_shape() {
        let at = Utc::now();
        let event = OrderEvent::status_changed(
            &OrderId::from("ord_1"),
            OrderStatus::Preparing,
            OrderStatus::Ready,
            at,
        );
        let envelope = event.to_envelope("order", Version::new(4), at).unwrap();

        assert_eq!(envelope.event_type, "OrderStatusChanged");
        assert_eq!(envelope.aggregate_id, "ord_1");
        assert_eq!(envelope.data["orderId"], "ord_1");
        assert_eq!(envelope.data["oldStatus"], "PREPARING");
        assert_eq!(envelope.data["newStatus"], "READY");
    }
}
