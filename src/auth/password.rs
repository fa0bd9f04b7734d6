//! Password hashing and verification for GradeTrack.
//!
//! Uses Argon2id for secure password hashing. Complexity rules live in
//! [`crate::auth::validation`]; this module only hashes and verifies.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand_core::OsRng;
use thiserror::Error;

use crate::config::SecurityConfig;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Hashing parameters are invalid.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// Argon2 work-factor parameters.
///
/// The slow-hash cost knob of the credential policy. Verification reads the
/// parameters embedded in each stored PHC string, so these only affect newly
/// created hashes.
#[derive(Debug, Clone, Copy)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Time cost (iterations).
    pub iterations: u32,
    /// Parallelism (threads).
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl From<&SecurityConfig> for HashParams {
    fn from(config: &SecurityConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Create the Argon2 hasher for the given parameters.
fn create_argon2(params: &HashParams) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password using Argon2id.
///
/// Returns a PHC-formatted hash string that includes the salt and parameters.
///
/// # Examples
///
/// ```
/// use gradetrack::auth::{hash_password, HashParams};
///
/// let hash = hash_password("my_secure_password", &HashParams::default()).unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str, params: &HashParams) -> Result<String, PasswordError> {
    // Generate a random salt
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = create_argon2(params)?;
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Returns false on mismatch or on a malformed stored hash; a wrong password
/// is a normal negative result, never an error.
///
/// # Examples
///
/// ```
/// use gradetrack::auth::{hash_password, verify_password, HashParams};
///
/// let hash = hash_password("my_secure_password", &HashParams::default()).unwrap();
/// assert!(verify_password("my_secure_password", &hash));
/// assert!(!verify_password("wrong_password", &hash));
/// ```
pub fn verify_password(password: &str, hash: &str) -> bool {
    // The parameters are taken from the parsed hash, not from the config
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
