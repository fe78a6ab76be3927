//! Password credential handling.
//!
//! Passwords are stored as Argon2id hashes in PHC string format
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`). The string carries
//! its own salt and cost parameters, so verification needs nothing but the
//! stored text.
//!
//! Accounts imported from the legacy system carry bcrypt hashes
//! (`$2a$`/`$2b$`/`$2x$`/`$2y$`). Those still verify; new hashes are Argon2id.

use std::fmt;

use argon2::{
    password_hash::{PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;

/// Prefixes of the bcrypt modular-crypt variants.
const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

/// Argon2id memory cost in KiB.
const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Argon2id iteration count.
const TIME_COST: u32 = 2;
/// Argon2id lanes.
const PARALLELISM: u32 = 1;

/// Errors raised while hashing a password.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid hashing parameters: {0}")]
    Params(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// A stored password hash.
///
/// `Debug` never prints the value, so a `User` can be logged without leaking
/// hash material.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash string read back from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a plaintext candidate against this hash.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        verify(candidate, &self.0)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

fn hasher() -> Result<Argon2<'static>, CredentialError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| CredentialError::Params(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password with a fresh random salt.
///
/// # Errors
/// Returns error if the hasher rejects its parameters or input.
pub fn hash(plaintext: &str) -> Result<PasswordHash, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hashing(e.to_string()))?;
    Ok(PasswordHash(phc.to_string()))
}

/// Verify a plaintext candidate against a stored hash string.
///
/// The cost parameters and salt embedded in `hash_string` are used. A hash
/// string that does not parse is treated as a mismatch.
#[must_use]
pub fn verify(plaintext: &str, hash_string: &str) -> bool {
    if BCRYPT_PREFIXES.iter().any(|p| hash_string.starts_with(p)) {
        return bcrypt::verify(plaintext, hash_string).unwrap_or_else(|e| {
            tracing::debug!("Rejecting password check against malformed bcrypt hash: {e}");
            false
        });
    }

    let Ok(parsed) = PhcString::new(hash_string) else {
        tracing::debug!("Rejecting password check against malformed hash");
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
