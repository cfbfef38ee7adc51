//! Argon2id hashing for DAV credentials
//!
//! Clients present their API key as a Bearer token or as the Basic auth
//! password. Only the PHC string produced by [`ApiKeyHasher::hash`] is ever
//! written to configuration.
//!
//! ```
//! use infrastructure::adapters::ApiKeyHasher;
//!
//! let hasher = ApiKeyHasher::new();
//! let hash = hasher.hash("sk-calendar-sync").unwrap();
//!
//! assert!(hasher.verify("sk-calendar-sync", &hash).unwrap());
//! assert!(!hasher.verify("sk-other", &hash).unwrap());
//! ```

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::config::SecurityConfig;

/// Prefix shared by every Argon2 PHC string
const PHC_PREFIX: &str = "$argon2";

#[derive(Debug, Error)]
pub enum ApiKeyHashError {
    #[error("Failed to hash API key: {0}")]
    HashingFailed(String),

    #[error("Invalid hash format: {0}")]
    InvalidHashFormat(String),
}

/// Argon2id hasher with the crate's default cost parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyHasher;

impl ApiKeyHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hash a plaintext key into a self-describing PHC string
    ///
    /// # Errors
    ///
    /// Returns `ApiKeyHashError::HashingFailed` if Argon2 rejects the input.
    #[instrument(skip(self, api_key))]
    pub fn hash(&self, api_key: &str) -> Result<String, ApiKeyHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(api_key.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiKeyHashError::HashingFailed(e.to_string()))
    }

    /// Check a presented key against a stored hash
    ///
    /// # Errors
    ///
    /// Returns `ApiKeyHashError::InvalidHashFormat` if `hash` is not a PHC string.
    #[instrument(skip(self, api_key, hash))]
    pub fn verify(&self, api_key: &str, hash: &str) -> Result<bool, ApiKeyHashError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ApiKeyHashError::InvalidHashFormat(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(api_key.as_bytes(), &parsed)
            .is_ok())
    }

    #[must_use]
    pub fn is_hashed(value: &str) -> bool {
        value.starts_with(PHC_PREFIX)
    }

    /// Log a startup warning for configured keys that were never hashed
    ///
    /// Such entries can never authenticate. Returns how many were found.
    pub fn warn_plaintext_keys(config: &SecurityConfig) -> usize {
        let count = config.count_plaintext_keys();
        if count > 0 {
            warn!(
                plaintext_count = count,
                "Ignoring API keys that are not Argon2 hashes. \
                 Hash them with 'taskdav-cli hash-api-key <key>'"
            );
        }
        count
    }
}
