//! Domain error types.

use auth::AuthError;
use common::{Classify, ErrorKind, Interrupted};
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::kitchen::KitchenError;
use crate::menu::MenuError;
use crate::order::OrderError;
use crate::repository::RepositoryError;
use crate::reservation::ReservationError;
use crate::user::UserError;

/// Errors surfaced by application services.
///
/// Wraps the aggregate and infrastructure errors without changing their
/// kind, so the boundary can map any of them by [`Classify::kind`] alone.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Kitchen(#[from] KitchenError),

    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error(transparent)]
    Menu(#[from] MenuError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The caller's context was cancelled or ran out of time.
    #[error("operation aborted: {0}")]
    Cancelled(#[from] Interrupted),
}

impl Classify for DomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Order(e) => e.kind(),
            DomainError::Kitchen(e) => e.kind(),
            DomainError::Reservation(e) => e.kind(),
            DomainError::Menu(e) => e.kind(),
            DomainError::Inventory(e) => e.kind(),
            DomainError::User(e) => e.kind(),
            DomainError::Auth(e) => e.kind(),
            DomainError::Repository(e) => e.kind(),
            DomainError::Cancelled(_) => ErrorKind::Internal,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            DomainError::Order(e) => e.code(),
            DomainError::Kitchen(e) => e.code(),
            DomainError::Reservation(e) => e.code(),
            DomainError::Menu(e) => e.code(),
            DomainError::Inventory(e) => e.code(),
            DomainError::User(e) => e.code(),
            DomainError::Auth(e) => e.code(),
            DomainError::Repository(e) => e.code(),
            DomainError::Cancelled(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
