//! Email change flow.
//!
//! The change happens in two steps: a token is mailed to the requested new
//! address, and the change only applies once that token comes back. The
//! uniqueness of the new address is checked both at request time and again
//! at confirmation, because another account can claim the address while the
//! token is outstanding.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{validate_email, SessionInvalidator, TokenService, ValidationError};
use crate::db::{DbPool, TokenPurpose, UserRepository};
use crate::email::{EmailKind, MailError, Mailer};
use crate::GradetrackError;

/// Email change flow errors.
#[derive(Error, Debug)]
pub enum EmailChangeError {
    /// New address failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// New address is already held by another active account.
    #[error("email is already registered")]
    EmailTaken,

    /// The requesting user does not exist or is deleted.
    #[error("unknown user")]
    UnknownUser,

    /// Change token is unknown, expired, or of the wrong purpose.
    #[error("invalid or expired confirmation token")]
    InvalidToken,

    /// The confirmation email could not be sent.
    #[error(transparent)]
    Email(#[from] MailError),

    /// Underlying infrastructure failure.
    #[error(transparent)]
    Internal(#[from] GradetrackError),
}

/// Request an email change; sends a confirmation token to the new address.
pub async fn request_email_change(
    pool: &DbPool,
    tokens: &TokenService<'_>,
    mailer: &impl Mailer,
    user_id: i64,
    new_email: &str,
) -> Result<(), EmailChangeError> {
    validate_email(new_email)?;

    let users = UserRepository::new(pool);
    let Some(user) = users.get_by_id(user_id).await? else {
        return Err(EmailChangeError::UnknownUser);
    };
    if user.is_deleted() {
        return Err(EmailChangeError::UnknownUser);
    }

    if users.email_taken(new_email, Some(user_id)).await? {
        return Err(EmailChangeError::EmailTaken);
    }

    let token = tokens
        .issue_email_change(user_id, &user.email, new_email)
        .await?;
    mailer.send(EmailKind::EmailChange, new_email, &token.token).await?;

    info!(user_id, "Email change confirmation sent");
    Ok(())
}

/// Confirm an email change with a token from the confirmation email.
///
/// Re-checks at confirmation time that the new address is still free. If
/// another active account claimed it meanwhile, the token is burned and a
/// conflict reported; a fresh request is needed after that. On success the
/// address is swapped, marked verified, and every session invalidated.
/// Returns the new address.
pub async fn confirm_email_change(
    pool: &DbPool,
    invalidator: &SessionInvalidator<'_>,
    tokens: &TokenService<'_>,
    token_value: &str,
) -> Result<String, EmailChangeError> {
    let Some(token) = tokens.verify(token_value, TokenPurpose::EmailChange).await? else {
        return Err(EmailChangeError::InvalidToken);
    };
    let (Some(user_id), Some(new_email)) = (token.user_id, token.new_email.clone()) else {
        tokens.consume(token_value).await?;
        return Err(EmailChangeError::InvalidToken);
    };

    let users = UserRepository::new(pool);
    if users.email_taken(&new_email, Some(user_id)).await? {
        // Someone else claimed the address while the token was outstanding
        tokens.consume(token_value).await?;
        warn!(user_id, "Email change conflicted at confirmation; token burned");
        return Err(EmailChangeError::EmailTaken);
    }

    if !users.update_email(user_id, &new_email).await? {
        tokens.consume(token_value).await?;
        return Err(EmailChangeError::UnknownUser);
    }

    info!(user_id, "Email address changed");

    if let Err(e) = tokens.consume(token_value).await {
        warn!(error = %e, "Failed to consume email-change token");
    }
    if let Err(e) = invalidator.invalidate_all(user_id).await {
        warn!(error = %e, user_id, "Failed to invalidate sessions after email change");
    }

    Ok(new_email)
}
