//! Authentication and credential security for GradeTrack.
//!
//! This module holds the security core: password hashing and rotation,
//! single-use verification tokens, session invalidation, and the input
//! validation rules applied at registration and credential changes.

mod credential;
mod password;
mod sessions;
mod tokens;
mod validation;

pub use credential::CredentialStore;
pub use password::{hash_password, verify_password, HashParams, PasswordError};
pub use sessions::SessionInvalidator;
pub use tokens::{TokenService, TokenTtls};
pub use validation::{
    validate_email, validate_password, validate_registration, validate_username, ValidationError,
};
