//! Stock keeping: inventory items, the movement log and suppliers.

mod events;
mod item;
mod movement;
mod repository;
mod service;
mod state;
mod supplier;

pub use events::{
    InventoryEvent, InventoryItemCreatedData, StockAlertData, StockReceivedData, SupplierData,
};
pub use item::{InventoryItem, NewInventoryItem};
pub use movement::{InMemoryMovementRepository, Movement, MovementRepository};
pub use repository::{InMemoryInventoryRepository, InventoryFilter, InventoryRepository};
pub use service::InventoryService;
pub use state::{MovementType, StockLevel};
pub use supplier::{InMemorySupplierRepository, NewSupplier, Supplier, SupplierRepository};

use common::{Classify, ErrorKind, codes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("SKU is required")]
    MissingSku,

    #[error("name is required")]
    MissingName,

    #[error("invalid quantity: {quantity} (must be positive)")]
    InvalidQuantity { quantity: f64 },

    #[error("{field} cannot be negative: {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("cannot release {requested}: only {reserved} reserved")]
    ReleaseExceedsReserved { requested: f64, reserved: f64 },

    #[error("insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: f64,
        available: f64,
    },

    #[error("inventory item {sku} is inactive")]
    Inactive { sku: String },

    #[error("SKU already exists: {sku}")]
    DuplicateSku { sku: String },

    #[error("supplier name is required")]
    MissingSupplierName,

    #[error("supplier {supplier_id} is inactive")]
    SupplierInactive { supplier_id: String },
}

impl Classify for InventoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::MissingSku
            | InventoryError::MissingName
            | InventoryError::InvalidQuantity { .. }
            | InventoryError::NegativeValue { .. }
            | InventoryError::ReleaseExceedsReserved { .. }
            | InventoryError::MissingSupplierName => ErrorKind::Validation,
            InventoryError::InsufficientStock { .. }
            | InventoryError::Inactive { .. }
            | InventoryError::SupplierInactive { .. } => ErrorKind::Business,
            InventoryError::DuplicateSku { .. } => ErrorKind::Conflict,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            InventoryError::InsufficientStock { .. } => Some(codes::INSUFFICIENT_STOCK),
            _ => None,
        }
    }
}
