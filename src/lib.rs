//! GradeTrack account security core.
//!
//! Credential and verification-token lifecycle management for a student
//! grade-tracking web application: password hashing and rotation, single-use
//! email tokens, sliding-window rate limiting, and session invalidation,
//! composed into the account flows (registration, password reset, email
//! change, login, deletion).

pub mod auth;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod db;
pub mod email;
pub mod error;
pub mod flows;
pub mod logging;
pub mod rate_limit;

pub use config::Config;
pub use error::{GradetrackError, Result};
