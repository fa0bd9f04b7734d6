//! Verification token repository for GradeTrack.
//!
//! Stores the single-use tokens behind email verification, password reset,
//! and email change. Expiry is decided by the caller against the injected
//! clock; this layer only stores and deletes rows.

use super::DbPool;
use crate::{GradetrackError, Result};

const TOKEN_COLUMNS: &str =
    "id, token, purpose, user_id, email, new_email, created_at, expires_at";

/// Token purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Email ownership verification after registration.
    EmailVerify,
    /// Password reset.
    PasswordReset,
    /// Email address change confirmation.
    EmailChange,
}

impl TokenPurpose {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerify => "email_verify",
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailChange => "email_change",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "email_verify" => Some(TokenPurpose::EmailVerify),
            "password_reset" => Some(TokenPurpose::PasswordReset),
            "email_change" => Some(TokenPurpose::EmailChange),
            _ => None,
        }
    }
}

/// Verification token entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationToken {
    /// Token ID.
    pub id: i64,
    /// Opaque token value.
    pub token: String,
    /// Token purpose.
    pub purpose: String,
    /// Subject user ID (None for pre-account email verification).
    pub user_id: Option<i64>,
    /// Subject email address.
    pub email: String,
    /// Requested new email (payload for email change).
    pub new_email: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Expiration timestamp.
    pub expires_at: String,
}

impl VerificationToken {
    /// Get the token purpose as enum.
    pub fn purpose(&self) -> Option<TokenPurpose> {
        TokenPurpose::from_str(&self.purpose)
    }
}

/// New verification token for creation.
pub struct NewVerificationToken {
    /// Opaque token value.
    pub token: String,
    /// Token purpose.
    pub purpose: TokenPurpose,
    /// Subject user ID.
    pub user_id: Option<i64>,
    /// Subject email address.
    pub email: String,
    /// Requested new email (payload for email change).
    pub new_email: Option<String>,
    /// Expiration timestamp.
    pub expires_at: String,
}

/// Repository for verification token operations.
pub struct VerificationTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> VerificationTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new verification token.
    pub async fn create(&self, new_token: &NewVerificationToken) -> Result<VerificationToken> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO verification_tokens (token, purpose, user_id, email, new_email, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&new_token.token)
        .bind(new_token.purpose.as_str())
        .bind(new_token.user_id)
        .bind(&new_token.email)
        .bind(&new_token.new_email)
        .bind(&new_token.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| GradetrackError::NotFound("verification token".to_string()))
    }

    /// Get a token by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<VerificationToken>> {
        let token = sqlx::query_as::<_, VerificationToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM verification_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Get a token by its opaque value.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<VerificationToken>> {
        let result = sqlx::query_as::<_, VerificationToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM verification_tokens WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Delete a token by its opaque value. Idempotent: deleting an absent
    /// token is not an error. Returns the number of rows deleted.
    pub async fn delete_by_token(&self, token: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete all tokens for an email subject and purpose (supersede on issue).
    pub async fn delete_for_email(&self, purpose: TokenPurpose, email: &str) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM verification_tokens WHERE purpose = $1 AND email = $2")
                .bind(purpose.as_str())
                .bind(email)
                .execute(self.pool)
                .await
                .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete all tokens for a user subject and purpose (supersede on issue).
    pub async fn delete_for_user(&self, purpose: TokenPurpose, user_id: i64) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM verification_tokens WHERE purpose = $1 AND user_id = $2")
                .bind(purpose.as_str())
                .bind(user_id)
                .execute(self.pool)
                .await
                .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete all tokens that expired before `now` (cleanup).
    pub async fn delete_expired(&self, now: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(self.pool)
            .await
            .map_err(|e| GradetrackError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
