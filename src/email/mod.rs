//! Outgoing email for GradeTrack.
//!
//! Verification and reset links go out by SMTP in production; tests swap in
//! the recording mailer to capture messages instead of sending them.

mod mock;
mod smtp;

pub use mock::{RecordingMailer, SentEmail};
pub use smtp::SmtpMailer;

use thiserror::Error;

/// Mail delivery errors.
#[derive(Error, Debug)]
pub enum MailError {
    /// The message could not be built.
    #[error("failed to build message: {0}")]
    Build(String),

    /// SMTP delivery failed.
    #[error("failed to send mail: {0}")]
    Send(String),
}

/// Kind of lifecycle email being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Prove ownership of a newly registered address.
    Verification,
    /// Password reset link.
    PasswordReset,
    /// Confirm an email address change.
    EmailChange,
}

/// Sends lifecycle emails carrying a verification token.
///
/// Flows stay generic over the mailer so tests can observe what would have
/// been sent.
pub trait Mailer: Send + Sync {
    /// Send a lifecycle email of the given kind to `to`, with `token` as the
    /// opaque verification token value.
    fn send(
        &self,
        kind: EmailKind,
        to: &str,
        token: &str,
    ) -> impl std::future::Future<Output = Result<(), MailError>> + Send;
}
