//! Forgot-password and reset-password flow.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{validate_password, CredentialStore, SessionInvalidator, TokenService, ValidationError};
use crate::db::{DbPool, TokenPurpose, UserRepository};
use crate::email::{EmailKind, MailError, Mailer};
use crate::rate_limit::RateLimiter;
use crate::GradetrackError;

/// Password reset flow errors.
#[derive(Error, Debug)]
pub enum PasswordResetError {
    /// Too many reset requests for this address.
    #[error("too many requests, retry in {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the window opens again.
        retry_after_secs: u64,
    },

    /// Reset token is unknown, expired, or of the wrong purpose.
    #[error("invalid or expired reset token")]
    InvalidToken,

    /// New password failed complexity rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The reset email could not be sent.
    #[error(transparent)]
    Email(#[from] MailError),

    /// Underlying infrastructure failure.
    #[error(transparent)]
    Internal(#[from] GradetrackError),
}

/// Request a password reset email.
///
/// Returns `Ok(())` whether or not the address belongs to an account, so the
/// response never reveals account existence. Rate limiting applies before
/// the lookup and therefore also to unknown addresses.
pub async fn forgot_password(
    pool: &DbPool,
    limiter: &RateLimiter,
    tokens: &TokenService<'_>,
    mailer: &impl Mailer,
    email: &str,
) -> Result<(), PasswordResetError> {
    let decision = limiter.check(email);
    if !decision.is_allowed() {
        return Err(PasswordResetError::RateLimited {
            retry_after_secs: decision.retry_after_secs,
        });
    }

    let Some(user) = UserRepository::new(pool).get_active_by_email(email).await? else {
        debug!("Password reset requested for unknown address");
        return Ok(());
    };

    let token = tokens.issue_password_reset(user.id, &user.email).await?;
    mailer
        .send(EmailKind::PasswordReset, &user.email, &token.token)
        .await?;

    info!(user_id = user.id, "Password reset email sent");
    Ok(())
}

/// Complete a password reset with a token from the reset email.
///
/// On success the credential is rotated, the token consumed, every session
/// invalidated, and the address's rate-limit record cleared so the user can
/// immediately request again if needed. Once the rotation has happened the
/// remaining steps never undo it; their failures are logged as secondary.
pub async fn reset_password(
    pool: &DbPool,
    limiter: &RateLimiter,
    credentials: &CredentialStore<'_>,
    invalidator: &SessionInvalidator<'_>,
    tokens: &TokenService<'_>,
    token_value: &str,
    new_password: &str,
) -> Result<(), PasswordResetError> {
    let Some(token) = tokens.verify(token_value, TokenPurpose::PasswordReset).await? else {
        return Err(PasswordResetError::InvalidToken);
    };
    let Some(user_id) = token.user_id else {
        return Err(PasswordResetError::InvalidToken);
    };

    validate_password(new_password)?;

    credentials.rotate(user_id, new_password).await?;

    if let Err(e) = tokens.consume(token_value).await {
        warn!(error = %e, "Failed to consume reset token after rotation");
    }
    if let Err(e) = invalidator.invalidate_all(user_id).await {
        warn!(error = %e, user_id, "Failed to invalidate sessions after rotation");
    }
    limiter.reset(&token.email);

    info!(user_id, "Password reset completed");
    Ok(())
}
