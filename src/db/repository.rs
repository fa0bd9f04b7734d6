//! User repository for GradeTrack.
//!
//! This module provides CRUD operations for user accounts. "Active" in all
//! query names means not soft-deleted.

use super::user::{NewUser, User};
use super::DbPool;
use crate::{GradetrackError, Result};

const USER_COLUMNS: &str =
    "id, username, email, password, email_verified, created_at, deleted_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| GradetrackError::NotFound("user".to_string()))
    }

    /// Get a user by ID (active or soft-deleted).
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get an active user by email.
    pub async fn get_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get an active user by username or email.
    pub async fn get_active_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE (username = $1 COLLATE NOCASE OR email = $1) AND deleted_at IS NULL"
        ))
        .bind(identifier)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Check if a username is already taken by an active account.
    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE username = $1 COLLATE NOCASE AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Check if an email is held by an active account other than `exclude_user`.
    pub async fn email_taken(&self, email: &str, exclude_user: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE email = $1 AND deleted_at IS NULL AND id != COALESCE($2, -1)",
        )
        .bind(email)
        .bind(exclude_user)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Replace the stored password hash. Returns false if no such user.
    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the email address, marking it verified (the caller has proven
    /// ownership through a token). Returns false if no such user.
    pub async fn update_email(&self, id: i64, email: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET email = $1, email_verified = 1 WHERE id = $2")
                .bind(email)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark the current email address as verified.
    pub async fn mark_email_verified(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET email_verified = 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a user by stamping `deleted_at`. Returns false if the user
    /// is missing or already deleted.
    pub async fn soft_delete(&self, id: i64, deleted_at: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
                .bind(deleted_at)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample_new_user() -> NewUser {
        NewUser::new("student", "student@example.com", "$argon2id$hash")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&sample_new_user()).await.unwrap();
        assert_eq!(user.username, "student");
        assert_eq!(user.email, "student@example.com");
        assert!(!user.email_verified);
        assert!(user.is_active());

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "student");
    }

    #[tokio::test]
    async fn test_get_active_by_email() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&sample_new_user()).await.unwrap();

        let found = repo
            .get_active_by_email("student@example.com")
            .await
            .unwrap();
        assert!(found.is_some());

        repo.soft_delete(user.id, "2026-01-01 00:00:00").await.unwrap();
        let found = repo
            .get_active_by_email("student@example.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_active_by_username_or_email() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        repo.create(&sample_new_user()).await.unwrap();

        assert!(repo
            .get_active_by_username_or_email("student")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_active_by_username_or_email("STUDENT")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_active_by_username_or_email("student@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_active_by_username_or_email("nobody")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_email_taken_ignores_soft_deleted() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&sample_new_user()).await.unwrap();

        assert!(repo
            .email_taken("student@example.com", None)
            .await
            .unwrap());
        // The owner is excluded from its own conflict check
        assert!(!repo
            .email_taken("student@example.com", Some(user.id))
            .await
            .unwrap());

        repo.soft_delete(user.id, "2026-01-01 00:00:00").await.unwrap();
        assert!(!repo
            .email_taken("student@example.com", None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_update_password() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&sample_new_user()).await.unwrap();

        assert!(repo.update_password(user.id, "$argon2id$new").await.unwrap());
        let updated = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.password, "$argon2id$new");

        assert!(!repo.update_password(9999, "$argon2id$new").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_email_marks_verified() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&sample_new_user()).await.unwrap();

        assert!(repo.update_email(user.id, "new@example.com").await.unwrap());
        let updated = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert!(updated.email_verified);
    }

    #[tokio::test]
    async fn test_soft_delete_is_not_repeatable() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&sample_new_user()).await.unwrap();

        assert!(repo.soft_delete(user.id, "2026-01-01 00:00:00").await.unwrap());
        assert!(!repo.soft_delete(user.id, "2026-01-02 00:00:00").await.unwrap());

        // Row still exists, only marked
        let row = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(row.deleted_at.as_deref(), Some("2026-01-01 00:00:00"));
    }

    #[tokio::test]
    async fn test_mark_email_verified() {
        let db = setup().await;
        let repo = UserRepository::new(db.pool());
        let user = repo.create(&sample_new_user()).await.unwrap();

        assert!(repo.mark_email_verified(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().unwrap().email_verified);
    }
}
