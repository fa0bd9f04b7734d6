//! SMTP mailer backed by lettre.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{EmailKind, MailError, Mailer};
use crate::config::SmtpConfig;

/// Mailer that delivers through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    base_url: String,
}

impl SmtpMailer {
    /// Build a mailer from SMTP configuration.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Build(e.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn subject(kind: EmailKind) -> &'static str {
        match kind {
            EmailKind::Verification => "Verify your GradeTrack email address",
            EmailKind::PasswordReset => "Reset your GradeTrack password",
            EmailKind::EmailChange => "Confirm your new GradeTrack email address",
        }
    }

    fn body(&self, kind: EmailKind, token: &str) -> String {
        match kind {
            EmailKind::Verification => format!(
                "Welcome to GradeTrack!\n\n\
                 Confirm your email address by opening the link below:\n\n\
                 {}/verify-email?token={}\n\n\
                 The link is valid for 24 hours. If you did not sign up, you can\n\
                 ignore this message.\n",
                self.base_url, token
            ),
            EmailKind::PasswordReset => format!(
                "A password reset was requested for your GradeTrack account.\n\n\
                 Choose a new password by opening the link below:\n\n\
                 {}/reset-password?token={}\n\n\
                 The link is valid for 1 hour. If you did not request a reset,\n\
                 you can ignore this message; your password is unchanged.\n",
                self.base_url, token
            ),
            EmailKind::EmailChange => format!(
                "A request was made to move your GradeTrack account to this\n\
                 email address.\n\n\
                 Confirm the change by opening the link below:\n\n\
                 {}/confirm-email?token={}\n\n\
                 The link is valid for 24 hours. If you did not request this,\n\
                 you can ignore this message.\n",
                self.base_url, token
            ),
        }
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, kind: EmailKind, to: &str, token: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| MailError::Build(format!("invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| MailError::Build(format!("invalid to address: {e}")))?)
            .subject(Self::subject(kind))
            .header(ContentType::TEXT_PLAIN)
            .body(self.body(kind, token))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        info!(kind = ?kind, "Sent lifecycle email");
        Ok(())
    }
}
