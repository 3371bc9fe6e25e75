//! Credential hashing capability.
//!
//! # Invariants
//! - Stored credentials are PHC strings; raw passwords never leave this
//!   module and are never logged.
//! - `verify` returning `Ok(false)` means "wrong password"; `Err` means the
//!   stored hash itself is unusable.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hash/verify contract consumed by the identity service.
pub trait CredentialHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError>;
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, CredentialError>;
}

/// Credential backend failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    InvalidParams(String),
    Hashing(String),
    MalformedHash(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParams(message) => write!(f, "invalid argon2 parameters: {message}"),
            Self::Hashing(message) => write!(f, "failed to hash credential: {message}"),
            Self::MalformedHash(message) => write!(f, "malformed credential hash: {message}"),
        }
    }
}

impl Error for CredentialError {}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Memory cost in KiB.
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl CredentialConfig {
    /// Cheap parameters for tests.
    pub fn testing() -> Self {
        Self {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Argon2id implementation of `CredentialHasher`.
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl Argon2CredentialHasher {
    pub fn new(config: &CredentialConfig) -> Result<Self, CredentialError> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|err| CredentialError::InvalidParams(err.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| CredentialError::Hashing(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|err| CredentialError::MalformedHash(err.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialError::MalformedHash(err.to_string())),
        }
    }
}
