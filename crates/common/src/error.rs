//! Error taxonomy shared by every layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of a failure, the sole signal used to map errors at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Input failed a field-level rule.
    Validation,
    /// Aggregate or child entity absent.
    NotFound,
    /// A rule was violated given the current state.
    Business,
    /// Duplicate within a parent, or a concurrent write collided.
    Conflict,
    /// Authentication or authorization denied.
    Unauthorized,
    /// Unexpected; details must not reach clients.
    Internal,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "notFound",
            ErrorKind::Business => "business",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can be classified into the shared taxonomy.
pub trait Classify {
    /// Returns the error kind.
    fn kind(&self) -> ErrorKind;

    /// Returns the stable business code, if this is a business rule violation.
    fn code(&self) -> Option<&'static str> {
        None
    }
}

/// Returned when parsing an enum from its wire name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what}: {value}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}

impl Classify for ParseEnumError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Stable business rule codes.
pub mod codes {
    pub const INVALID_STATUS_TRANSITION: &str = "INVALID_STATUS_TRANSITION";
    pub const INVALID_ORDER_TYPE: &str = "INVALID_ORDER_TYPE";
    pub const ORDER_NOT_CANCELLABLE: &str = "ORDER_NOT_CANCELLABLE";
    pub const ORDER_NOT_MODIFIABLE: &str = "ORDER_NOT_MODIFIABLE";
    pub const ITEM_NOT_FOUND: &str = "ITEM_NOT_FOUND";
    pub const KITCHEN_ORDER_NOT_MODIFIABLE: &str = "KITCHEN_ORDER_NOT_MODIFIABLE";
    pub const INVALID_RESERVATION_STATE: &str = "INVALID_RESERVATION_STATE";
    pub const INSUFFICIENT_STOCK: &str = "INSUFFICIENT_STOCK";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ErrorKind::Validation.to_string(), "validation");
        assert_eq!(ErrorKind::NotFound.to_string(), "notFound");
        assert_eq!(ErrorKind::Business.to_string(), "business");
        assert_eq!(ErrorKind::Conflict.to_string(), "conflict");
        assert_eq!(ErrorKind::Unauthorized.to_string(), "unauthorized");
        assert_eq!(ErrorKind::Internal.to_string(), "internal");
    }

    #[test]
    fn kind_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"notFound\"");
    }
}
