//! Menu catalog and dish availability.

mod aggregate;
mod catalog;
mod events;
mod repository;
mod service;

pub use aggregate::Menu;
pub use catalog::{Category, MenuItem, NewMenuItem};
pub use events::{ItemAvailabilityChangedData, MenuActivationData, MenuCreatedData, MenuEvent};
pub use repository::{InMemoryMenuRepository, MenuFilter, MenuRepository};
pub use service::MenuService;

use common::{Classify, ErrorKind, codes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("name is required")]
    MissingName,

    #[error("invalid price: {price} (must be zero or more)")]
    InvalidPrice { price: f64 },

    #[error("category already exists: {name}")]
    DuplicateCategory { name: String },

    #[error("item already exists in category: {name}")]
    DuplicateItem { name: String },

    #[error("category not found: {category_id}")]
    CategoryNotFound { category_id: String },

    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: String },
}

impl Classify for MenuError {
    fn kind(&self) -> ErrorKind {
        match self {
            MenuError::MissingName | MenuError::InvalidPrice { .. } => ErrorKind::Validation,
            MenuError::DuplicateCategory { .. } | MenuError::DuplicateItem { .. } => {
                ErrorKind::Conflict
            }
            MenuError::CategoryNotFound { .. } => ErrorKind::NotFound,
            MenuError::ItemNotFound { .. } => ErrorKind::Business,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            MenuError::ItemNotFound { .. } => Some(codes::ITEM_NOT_FOUND),
            _ => None,
        }
    }
}
