//! Kitchen domain events.

use chrono::{DateTime, Utc};
use common::{KitchenItemId, KitchenOrderId, OrderId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{KitchenItemStatus, KitchenOrderStatus, Priority};

/// Events published by the kitchen service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum KitchenEvent {
    KitchenOrderCreated(KitchenOrderCreatedData),

    /// Carries the referenced order id; the order service follows it.
    KitchenOrderStatusChanged(KitchenOrderStatusChangedData),

    KitchenItemStatusChanged(KitchenItemStatusChangedData),

    KitchenOrderCompleted(KitchenOrderCompletedData),
}

impl DomainEvent for KitchenEvent {
    fn event_type(&self) -> &'static str {
        match self {
            KitchenEvent::KitchenOrderCreated(_) => "KitchenOrderCreated",
            KitchenEvent::KitchenOrderStatusChanged(_) => "KitchenOrderStatusChanged",
            KitchenEvent::KitchenItemStatusChanged(_) => "KitchenItemStatusChanged",
            KitchenEvent::KitchenOrderCompleted(_) => "KitchenOrderCompleted",
        }
    }

    fn aggregate_id(&self) -> String {
        let id = match self {
            KitchenEvent::KitchenOrderCreated(d) => &d.kitchen_order_id,
            KitchenEvent::KitchenOrderStatusChanged(d) => &d.kitchen_order_id,
            KitchenEvent::KitchenItemStatusChanged(d) => &d.kitchen_order_id,
            KitchenEvent::KitchenOrderCompleted(d) => &d.kitchen_order_id,
        };
        id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrderCreatedData {
    pub kitchen_order_id: KitchenOrderId,
    pub order_id: OrderId,
    pub priority: Priority,
    pub item_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrderStatusChangedData {
    pub kitchen_order_id: KitchenOrderId,
    pub order_id: OrderId,
    pub old_status: KitchenOrderStatus,
    pub new_status: KitchenOrderStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenItemStatusChangedData {
    pub kitchen_order_id: KitchenOrderId,
    pub item_id: KitchenItemId,
    pub old_status: KitchenItemStatus,
    pub new_status: KitchenItemStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrderCompletedData {
    pub kitchen_order_id: KitchenOrderId,
    pub order_id: OrderId,
    pub completed_at: DateTime<Utc>,
}
