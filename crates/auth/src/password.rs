use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::{AuthError, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id password hashing.
#[derive(Debug, Clone)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    /// Uses the recommended default cost parameters.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Uses explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    /// Cheap parameters for tests.
    pub fn fast() -> Self {
        Self::with_params(Params::MIN_M_COST, 1, 1).unwrap_or_default()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Returns true if `password` matches the stored PHC hash.
    ///
    /// Cost parameters are read from the hash, so hashes made with other
    /// settings still verify.
    pub fn compare(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Enforces minimum strength: length plus upper, lower and digit.
    pub fn validate(&self, password: &str) -> Result<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword("must be at least 8 characters"));
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AuthError::WeakPassword(
                "must contain an uppercase letter",
            ));
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AuthError::WeakPassword("must contain a lowercase letter"));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::WeakPassword("must contain a digit"));
        }
        Ok(())
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_compare() {
        let service = PasswordService::fast();
        let hash = service.hash("Secret123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.compare("Secret123", &hash));
        assert!(!service.compare("secret123", &hash));
        assert!(!service.compare("Secret123", "not-a-hash"));
    }

    #[test]
    fn hashes_are_salted() {
        let service = PasswordService::fast();
        assert_ne!(
            service.hash("Secret123").unwrap(),
            service.hash("Secret123").unwrap()
        );
    }

    #[test]
    fn validate_enforces_strength() {
        let service = PasswordService::fast();
        assert!(service.validate("Secret123").is_ok());
        assert!(matches!(
            service.validate("Sh0rt"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(service.validate("alllowercase1").is_err());
        assert!(service.validate("ALLUPPERCASE1").is_err());
        assert!(service.validate("NoDigitsHere").is_err());
    }
}
