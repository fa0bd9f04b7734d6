//! Session invalidation for GradeTrack.
//!
//! After a password rotation, email change, or account deletion every
//! session the user holds must die, so a stolen session can't outlive the
//! credential it was minted under.

use tracing::info;

use crate::db::{DbPool, SessionRepository};
use crate::Result;

/// Tears down user sessions after credential or identity changes.
pub struct SessionInvalidator<'a> {
    pool: &'a DbPool,
}

impl<'a> SessionInvalidator<'a> {
    /// Create an invalidator over the given pool.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Delete every session the user holds. Returns the number deleted;
    /// a user with no sessions yields 0, which is not an error.
    pub async fn invalidate_all(&self, user_id: i64) -> Result<u64> {
        let deleted = SessionRepository::new(self.pool)
            .delete_all_for_user(user_id)
            .await?;

        if deleted > 0 {
            info!(user_id, deleted, "Invalidated user sessions");
        }
        Ok(deleted)
    }
}
