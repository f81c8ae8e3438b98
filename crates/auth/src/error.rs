use common::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("expected {expected} token")]
    WrongTokenKind { expected: &'static str },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("weak password: {0}")]
    WeakPassword(&'static str),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

impl Classify for AuthError {
    fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::WrongTokenKind { .. }
            | AuthError::InvalidCredentials => ErrorKind::Unauthorized,
            AuthError::WeakPassword(_) => ErrorKind::Validation,
            AuthError::Hashing(_) | AuthError::Encoding(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
