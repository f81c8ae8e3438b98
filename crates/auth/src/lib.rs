//! Stateless credential primitives: signed tokens, password hashes and
//! token digests. Safe to share across threads.

pub mod error;
pub mod jwt;
pub mod password;
pub mod token;

pub use error::{AuthError, Result};
pub use jwt::{Claims, JwtConfig, JwtService, TokenKind, TokenPair};
pub use password::PasswordService;
pub use token::hash_token;
