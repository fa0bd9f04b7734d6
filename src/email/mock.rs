//! Recording mailer for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{EmailKind, MailError, Mailer};

/// A message the recording mailer captured instead of sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Kind of lifecycle email.
    pub kind: EmailKind,
    /// Recipient address.
    pub to: String,
    /// Token value the message carried.
    pub token: String,
}

/// Mailer that records messages in memory.
///
/// Can be switched to fail so flows can be tested against delivery errors.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    /// Create an empty recording mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail (or succeed again with `false`).
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// All messages captured so far.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// The most recently captured message.
    pub fn last(&self) -> Option<SentEmail> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// Number of captured messages.
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, kind: EmailKind, to: &str, token: &str) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Send("recording mailer set to fail".to_string()));
        }

        self.sent.lock().unwrap().push(SentEmail {
            kind,
            to: to.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_sent_messages() {
        let mailer = RecordingMailer::new();
        mailer
            .send(EmailKind::Verification, "a@x.com", "tok-1")
            .await
            .unwrap();
        mailer
            .send(EmailKind::PasswordReset, "b@x.com", "tok-2")
            .await
            .unwrap();

        assert_eq!(mailer.count(), 2);
        let last = mailer.last().unwrap();
        assert_eq!(last.kind, EmailKind::PasswordReset);
        assert_eq!(last.to, "b@x.com");
        assert_eq!(last.token, "tok-2");

        // sent() preserves send order
        let kinds: Vec<_> = mailer.sent().into_iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![EmailKind::Verification, EmailKind::PasswordReset]);
    }

    #[tokio::test]
    async fn test_failure_switch() {
        let mailer = RecordingMailer::new();
        mailer.set_failing(true);
        assert!(mailer
            .send(EmailKind::Verification, "a@x.com", "tok")
            .await
            .is_err());
        assert_eq!(mailer.count(), 0);

        mailer.set_failing(false);
        assert!(mailer
            .send(EmailKind::Verification, "a@x.com", "tok")
            .await
            .is_ok());
    }
}
