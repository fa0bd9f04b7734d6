//! Error types for GradeTrack.

use thiserror::Error;

/// Common error type for GradeTrack.
#[derive(Error, Debug)]
pub enum GradetrackError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from any database
    /// backend. Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for GradetrackError {
    fn from(e: sqlx::Error) -> Self {
        GradetrackError::Database(e.to_string())
    }
}

/// Result type alias for GradeTrack operations.
pub type Result<T> = std::result::Result<T, GradetrackError>;
