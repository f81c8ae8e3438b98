//! Kitchen tickets: one per paid order, rolled up from their items.

mod aggregate;
mod commands;
mod events;
mod item;
mod repository;
mod service;
mod state;

pub use aggregate::KitchenOrder;
pub use commands::{CreateKitchenOrder, KitchenOrderFilter};
pub use events::{
    KitchenEvent, KitchenItemStatusChangedData, KitchenOrderCompletedData,
    KitchenOrderCreatedData, KitchenOrderStatusChangedData,
};
pub use item::{KitchenItem, NewKitchenItem};
pub use repository::{InMemoryKitchenOrderRepository, KitchenOrderRepository};
pub use service::KitchenService;
pub use state::{KitchenItemStatus, KitchenOrderStatus, Priority};

use common::{Classify, ErrorKind, codes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KitchenError {
    #[error("order id is required")]
    MissingOrderId,

    #[error("menu item id is required")]
    MissingMenuItem,

    #[error("item name is required")]
    MissingItemName,

    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i32 },

    #[error("station must not be empty")]
    EmptyStation,

    #[error("notes must not be empty")]
    EmptyNotes,

    #[error("kitchen order has no items")]
    NoItems,

    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: KitchenOrderStatus,
        to: KitchenOrderStatus,
    },

    #[error("invalid item status transition from {from} to {to}")]
    InvalidItemTransition {
        from: KitchenItemStatus,
        to: KitchenItemStatus,
    },

    #[error("kitchen order in status {status} cannot be modified")]
    NotModifiable { status: KitchenOrderStatus },

    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: String },
}

impl Classify for KitchenError {
    fn kind(&self) -> ErrorKind {
        match self {
            KitchenError::InvalidStatusTransition { .. }
            | KitchenError::InvalidItemTransition { .. }
            | KitchenError::NotModifiable { .. }
            | KitchenError::ItemNotFound { .. } => ErrorKind::Business,
            _ => ErrorKind::Validation,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            KitchenError::InvalidStatusTransition { .. }
            | KitchenError::InvalidItemTransition { .. } => Some(codes::INVALID_STATUS_TRANSITION),
            KitchenError::NotModifiable { .. } => Some(codes::KITCHEN_ORDER_NOT_MODIFIABLE),
            KitchenError::ItemNotFound { .. } => Some(codes::ITEM_NOT_FOUND),
            _ => None,
        }
    }
}
