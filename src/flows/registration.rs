//! Registration and email verification flow.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{validate_registration, CredentialStore, TokenService, ValidationError};
use crate::db::{DbPool, NewUser, TokenPurpose, User, UserRepository};
use crate::email::{EmailKind, MailError, Mailer};
use crate::GradetrackError;

/// Registration flow errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Username is already held by an active account.
    #[error("username is already taken")]
    UsernameTaken,

    /// Email is already held by an active account.
    #[error("email is already registered")]
    EmailTaken,

    /// Verification token is unknown, expired, or of the wrong purpose.
    #[error("invalid or expired verification token")]
    InvalidToken,

    /// The verification email could not be sent.
    #[error(transparent)]
    Email(#[from] MailError),

    /// Underlying infrastructure failure.
    #[error(transparent)]
    Internal(#[from] GradetrackError),
}

/// Register a new account and send the email verification message.
///
/// The account is created unverified; the returned user can log in, but the
/// email address is only trusted once [`verify_email`] completes. A soft
/// deleted account does not block reuse of its username or email.
pub async fn register(
    pool: &DbPool,
    credentials: &CredentialStore<'_>,
    tokens: &TokenService<'_>,
    mailer: &impl Mailer,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, RegistrationError> {
    validate_registration(username, email, password)?;

    let users = UserRepository::new(pool);
    if users.username_taken(username).await? {
        return Err(RegistrationError::UsernameTaken);
    }
    if users.email_taken(email, None).await? {
        return Err(RegistrationError::EmailTaken);
    }

    let hash = credentials.hash(password)?;
    let user = users.create(&NewUser::new(username, email, &hash)).await?;
    info!(user_id = user.id, "Registered new account");

    let token = tokens.issue_email_verification(email).await?;
    mailer.send(EmailKind::Verification, email, &token.token).await?;

    Ok(user)
}

/// Complete email verification with a token from the verification email.
pub async fn verify_email(
    pool: &DbPool,
    tokens: &TokenService<'_>,
    token_value: &str,
) -> Result<(), RegistrationError> {
    let Some(token) = tokens.verify(token_value, TokenPurpose::EmailVerify).await? else {
        return Err(RegistrationError::InvalidToken);
    };

    let users = UserRepository::new(pool);
    let Some(user) = users.get_active_by_email(&token.email).await? else {
        // The account vanished between issue and verification
        tokens.consume(token_value).await?;
        return Err(RegistrationError::InvalidToken);
    };

    users.mark_email_verified(user.id).await?;
    info!(user_id = user.id, "Email address verified");

    // The verification already succeeded; a failed consume only leaves a
    // token that expiry cleanup will remove.
    if let Err(e) = tokens.consume(token_value).await {
        warn!(error = %e, "Failed to consume verification token");
    }

    Ok(())
}
