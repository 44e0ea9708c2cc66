//! Password hashing - Domain layer password handling.
//!
//! Hashes are PHC strings produced by Argon2id with a random salt per hash.
//! Plain text never leaves this module in any form other than the hash.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::{DomainError, DomainResult};

/// One-way password hashing used by the application service.
///
/// Implementations are CPU bound; async callers should run them on a
/// blocking thread.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain-text password into a self-describing hash string.
    fn hash(&self, plain_text: &str) -> DomainResult<String>;

    /// Check a plain-text password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for unreadable
    /// hashes or hasher failures.
    fn verify(&self, plain_text: &str, hash: &str) -> DomainResult<bool>;
}

/// Reject passwords shorter than [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password_strength(plain_text: &str) -> DomainResult<()> {
    if plain_text.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Argon2id hasher with fixed parameters.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    /// Hasher using the recommended Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> DomainResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| DomainError::internal(format!("Invalid argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    #[inline]
    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain_text: &str, hash: &str) -> DomainResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| DomainError::internal(format!("Invalid hash format: {}", e)))?;

        match self.argon2().verify_password(plain_text.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(DomainError::internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("SecurePassword123!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("SecurePassword123!", &hash).unwrap());
        assert!(!hasher.verify("WrongPassword123", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = hasher();
        let first = hasher.hash("SamePassword123").unwrap();
        let second = hasher.hash("SamePassword123").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("SamePassword123", &first).unwrap());
        assert!(hasher.verify("SamePassword123", &second).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let result = hasher().verify("whatever1", "not-a-phc-string");
        assert!(matches!(result, Err(DomainError::Internal(_))));
    }

    #[test]
    fn test_hash_verifies_with_default_hasher() {
        // parameters are encoded in the hash, so any Argon2 instance can verify
        let hash = hasher().hash("Portable123").unwrap();
        assert!(Argon2Hasher::new().verify("Portable123", &hash).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("short").is_err());
        assert!(validate_password_strength("12345678").is_ok());
        // counted in characters, not bytes
        assert!(validate_password_strength("ééééééé").is_err());
    }
}
