//! Staff accounts, roles and login sessions.

mod aggregate;
mod events;
mod permission;
mod repository;
mod service;
mod session;

pub use aggregate::{User, normalize_email};
pub use events::{SessionEventData, UserChangedData, UserEvent, UserRegisteredData};
pub use permission::{
    ADMIN, Action, CASHIER, HOST, KITCHEN_STAFF, MANAGER, Permission, Resource, Role, WAITSTAFF,
    default_roles,
};
pub use repository::{
    InMemoryRoleRepository, InMemorySessionRepository, InMemoryUserRepository, RoleRepository,
    SessionRepository, UserFilter, UserRepository,
};
pub use service::{Authenticated, LoginResult, RegisterUser, UserService};
pub use session::{ClientInfo, UserSession};

use common::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("role name is required")]
    MissingRoleName,

    #[error("email already registered: {email}")]
    EmailTaken { email: String },

    #[error("role not found: {role}")]
    RoleNotFound { role: String },

    #[error("session has expired")]
    SessionExpired,

    #[error("session has been revoked")]
    SessionRevoked,

    #[error("user account is inactive")]
    Inactive,

    #[error("not allowed to {action} {resource}")]
    Forbidden { resource: Resource, action: Action },
}

impl Classify for UserError {
    fn kind(&self) -> ErrorKind {
        match self {
            UserError::InvalidEmail { .. }
            | UserError::MissingRoleName
            | UserError::SessionExpired
            | UserError::SessionRevoked => ErrorKind::Validation,
            UserError::EmailTaken { .. } => ErrorKind::Conflict,
            UserError::RoleNotFound { .. } => ErrorKind::NotFound,
            UserError::Inactive | UserError::Forbidden { .. } => ErrorKind::Unauthorized,
        }
    }
}
