//! Login, password change, and account deletion.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{validate_password, verify_password, CredentialStore, SessionInvalidator, ValidationError};
use crate::clock::Clock;
use crate::datetime::format_timestamp;
use crate::db::{DbPool, NewSession, Session, SessionRepository, UserRepository};
use crate::GradetrackError;

/// How long a login session stays valid.
const SESSION_TTL_HOURS: i64 = 24;

/// Account flow errors.
#[derive(Error, Debug)]
pub enum AccountError {
    /// Unknown identifier, wrong password, or deleted account. One variant
    /// on purpose: the caller can't tell which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// New password failed complexity rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// New password is identical to the current one.
    #[error("new password must differ from the current password")]
    SamePassword,

    /// Underlying infrastructure failure.
    #[error(transparent)]
    Internal(#[from] GradetrackError),
}

/// Log in with a username or email and password. Returns a fresh session.
pub async fn login(
    pool: &DbPool,
    clock: &Arc<dyn Clock>,
    identifier: &str,
    password: &str,
) -> Result<Session, AccountError> {
    let Some(user) = UserRepository::new(pool)
        .get_active_by_username_or_email(identifier)
        .await?
    else {
        return Err(AccountError::InvalidCredentials);
    };

    if !verify_password(password, &user.password) {
        return Err(AccountError::InvalidCredentials);
    }

    let expires_at = clock.now() + Duration::hours(SESSION_TTL_HOURS);
    let session = SessionRepository::new(pool)
        .create(&NewSession {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: format_timestamp(&expires_at),
        })
        .await?;

    info!(user_id = user.id, "User logged in");
    Ok(session)
}

/// Change the password of a logged-in user.
///
/// Requires the current password, rejects a no-op change, and invalidates
/// every session afterwards so other devices must log in again.
pub async fn change_password(
    pool: &DbPool,
    credentials: &CredentialStore<'_>,
    invalidator: &SessionInvalidator<'_>,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<(), AccountError> {
    if !credentials.verify(user_id, current_password).await? {
        return Err(AccountError::InvalidCredentials);
    }
    if credentials.verify(user_id, new_password).await? {
        return Err(AccountError::SamePassword);
    }
    validate_password(new_password)?;

    credentials.rotate(user_id, new_password).await?;

    if let Err(e) = invalidator.invalidate_all(user_id).await {
        warn!(error = %e, user_id, "Failed to invalidate sessions after password change");
    }

    Ok(())
}

/// Soft-delete an account after confirming the password.
///
/// The row is kept with a deletion timestamp; the username and email become
/// available to new registrations, and every session dies.
pub async fn delete_account(
    pool: &DbPool,
    clock: &Arc<dyn Clock>,
    credentials: &CredentialStore<'_>,
    invalidator: &SessionInvalidator<'_>,
    user_id: i64,
    password: &str,
) -> Result<(), AccountError> {
    if !credentials.verify(user_id, password).await? {
        return Err(AccountError::InvalidCredentials);
    }

    let deleted_at = format_timestamp(&clock.now());
    if !UserRepository::new(pool).soft_delete(user_id, &deleted_at).await? {
        return Err(AccountError::InvalidCredentials);
    }

    info!(user_id, "Account soft-deleted");

    if let Err(e) = invalidator.invalidate_all(user_id).await {
        warn!(error = %e, user_id, "Failed to invalidate sessions after deletion");
    }

    Ok(())
}
