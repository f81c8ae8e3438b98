//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod repository;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::{CreateOrder, OrderFilter};
pub use events::{
    OrderCancelledData, OrderCompletedData, OrderCreatedData, OrderEvent, OrderPaidData,
    OrderStatusChangedData, PaidItem,
};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
pub use state::{OrderStatus, OrderType};
pub use value_objects::{NewOrderItem, OrderItem, Pricing, TAX_RATE};

use common::{Classify, ErrorKind, codes};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("customer id is required")]
    MissingCustomer,

    #[error("menu item id is required")]
    MissingMenuItem,

    #[error("item name is required")]
    MissingItemName,

    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i32 },

    #[error("invalid unit price: {price} (must be zero or more)")]
    InvalidPrice { price: f64 },

    #[error("table id must not be empty")]
    EmptyTableId,

    #[error("delivery address must not be empty")]
    EmptyDeliveryAddress,

    #[error("notes must not be empty")]
    EmptyNotes,

    #[error("order has no items")]
    NoItems,

    #[error("dine-in order requires a table")]
    MissingTableId,

    #[error("delivery order requires a delivery address")]
    MissingDeliveryAddress,

    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("cannot {operation} on a {order_type} order")]
    InvalidOrderType {
        operation: &'static str,
        order_type: OrderType,
    },

    #[error("order in status {status} cannot be cancelled")]
    NotCancellable { status: OrderStatus },

    #[error("order in status {status} cannot be modified")]
    NotModifiable { status: OrderStatus },

    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: String },
}

impl Classify for OrderError {
    fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidStatusTransition { .. }
            | OrderError::InvalidOrderType { .. }
            | OrderError::NotCancellable { .. }
            | OrderError::NotModifiable { .. }
            | OrderError::ItemNotFound { .. } => ErrorKind::Business,
            _ => ErrorKind::Validation,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            OrderError::InvalidStatusTransition { .. } => Some(codes::INVALID_STATUS_TRANSITION),
            OrderError::InvalidOrderType { .. } => Some(codes::INVALID_ORDER_TYPE),
            OrderError::NotCancellable { .. } => Some(codes::ORDER_NOT_CANCELLABLE),
            OrderError::NotModifiable { .. } => Some(codes::ORDER_NOT_MODIFIABLE),
            OrderError::ItemNotFound { .. } => Some(codes::ITEM_NOT_FOUND),
            _ => None,
        }
    }
}
