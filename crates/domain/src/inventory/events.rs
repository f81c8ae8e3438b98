//! Inventory domain events.

use chrono::{DateTime, Utc};
use common::{InventoryItemId, MenuItemId, SupplierId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::StockLevel;

/// Events published by the inventory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InventoryEvent {
    InventoryItemCreated(InventoryItemCreatedData),

    StockReceived(StockReceivedData),

    /// The item entered the LOW level.
    LowStockAlert(StockAlertData),

    /// The item entered the OUT level.
    OutOfStockAlert(StockAlertData),

    SupplierCreated(SupplierData),

    SupplierDeactivated(SupplierData),
}

impl DomainEvent for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::InventoryItemCreated(_) => "InventoryItemCreated",
            InventoryEvent::StockReceived(_) => "StockReceived",
            InventoryEvent::LowStockAlert(_) => "LowStockAlert",
            InventoryEvent::OutOfStockAlert(_) => "OutOfStockAlert",
            InventoryEvent::SupplierCreated(_) => "SupplierCreated",
            InventoryEvent::SupplierDeactivated(_) => "SupplierDeactivated",
        }
    }

    fn aggregate_id(&self) -> String {
        match self {
            InventoryEvent::InventoryItemCreated(d) => d.item_id.to_string(),
            InventoryEvent::StockReceived(d) => d.item_id.to_string(),
            InventoryEvent::LowStockAlert(d) | InventoryEvent::OutOfStockAlert(d) => {
                d.item_id.to_string()
            }
            InventoryEvent::SupplierCreated(d) | InventoryEvent::SupplierDeactivated(d) => {
                d.supplier_id.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemCreatedData {
    pub item_id: InventoryItemId,
    pub sku: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReceivedData {
    pub item_id: InventoryItemId,
    pub sku: String,
    pub quantity: f64,
    pub current_stock: f64,
    pub available_stock: f64,
    pub level: StockLevel,
    #[serde(default)]
    pub menu_item_ids: Vec<MenuItemId>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlertData {
    pub item_id: InventoryItemId,
    pub sku: String,
    pub name: String,
    pub available_stock: f64,
    pub minimum_stock: f64,
    #[serde(default)]
    pub menu_item_ids: Vec<MenuItemId>,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierData {
    pub supplier_id: SupplierId,
    pub name: String,
    pub changed_at: DateTime<Utc>,
}
