//! Session repository for GradeTrack.
//!
//! Sessions are opaque to the security core; the only operation it relies on
//! is deleting every session a user holds after a credential or identity
//! change.

use super::DbPool;
use crate::{GradetrackError, Result};

/// Session entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    /// Opaque session token.
    pub token: String,
    /// User ID.
    pub user_id: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Expiration timestamp.
    pub expires_at: String,
}

/// New session for creation.
pub struct NewSession {
    /// Opaque session token.
    pub token: String,
    /// User ID.
    pub user_id: i64,
    /// Expiration timestamp.
    pub expires_at: String,
}

/// Repository for session operations.
pub struct SessionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new session.
    pub async fn create(&self, new_session: &NewSession) -> Result<Session> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&new_session.token)
            .bind(new_session.user_id)
            .bind(&new_session.expires_at)
            .execute(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        self.get_by_token(&new_session.token)
            .await?
            .ok_or_else(|| GradetrackError::NotFound("session".to_string()))
    }

    /// Get a session by token.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(session)
    }

    /// Delete all sessions for a user. Returns the number deleted.
    pub async fn delete_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Count the sessions a user currently holds.
    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(count)
    }
}
