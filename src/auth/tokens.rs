//! Verification token service for GradeTrack.
//!
//! Issues, verifies, and consumes the single-use tokens that prove email
//! ownership. Each issue supersedes any earlier outstanding token for the
//! same subject and purpose. Expiry is evaluated against the injected clock
//! at verification time; expired rows stay in place until the periodic
//! cleanup removes them.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::SecurityConfig;
use crate::datetime::{format_timestamp, parse_timestamp};
use crate::db::{
    DbPool, NewVerificationToken, TokenPurpose, VerificationToken, VerificationTokenRepository,
};
use crate::Result;

/// Token lifetimes per purpose.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    /// Lifetime of email verification and email-change tokens.
    pub email: Duration,
    /// Lifetime of password-reset tokens.
    pub reset: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            email: Duration::hours(24),
            reset: Duration::hours(1),
        }
    }
}

impl From<&SecurityConfig> for TokenTtls {
    fn from(config: &SecurityConfig) -> Self {
        Self {
            email: Duration::seconds(config.email_token_ttl_secs as i64),
            reset: Duration::seconds(config.reset_token_ttl_secs as i64),
        }
    }
}

/// Issues and redeems verification tokens.
pub struct TokenService<'a> {
    pool: &'a DbPool,
    clock: Arc<dyn Clock>,
    ttls: TokenTtls,
}

impl<'a> TokenService<'a> {
    /// Create a token service over the given pool.
    pub fn new(pool: &'a DbPool, clock: Arc<dyn Clock>, ttls: TokenTtls) -> Self {
        Self { pool, clock, ttls }
    }

    /// Generate an unguessable opaque token value.
    fn generate_value() -> String {
        // Two UUIDv4s give 64 hex characters of randomness
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::PasswordReset => self.ttls.reset,
            TokenPurpose::EmailVerify | TokenPurpose::EmailChange => self.ttls.email,
        }
    }

    async fn issue(
        &self,
        purpose: TokenPurpose,
        user_id: Option<i64>,
        email: &str,
        new_email: Option<&str>,
    ) -> Result<VerificationToken> {
        let repo = VerificationTokenRepository::new(self.pool);

        // Supersede any outstanding token for the same subject and purpose
        let superseded = match user_id {
            Some(id) => repo.delete_for_user(purpose, id).await?,
            None => repo.delete_for_email(purpose, email).await?,
        };
        if superseded > 0 {
            debug!(purpose = purpose.as_str(), superseded, "Superseded outstanding tokens");
        }

        let expires_at = self.clock.now() + self.ttl_for(purpose);
        let token = repo
            .create(&NewVerificationToken {
                token: Self::generate_value(),
                purpose,
                user_id,
                email: email.to_string(),
                new_email: new_email.map(str::to_string),
                expires_at: format_timestamp(&expires_at),
            })
            .await?;

        info!(
            purpose = purpose.as_str(),
            token_id = token.id,
            "Issued verification token"
        );
        Ok(token)
    }

    /// Issue an email verification token for a newly registered address.
    pub async fn issue_email_verification(&self, email: &str) -> Result<VerificationToken> {
        self.issue(TokenPurpose::EmailVerify, None, email, None).await
    }

    /// Issue a password-reset token for a user.
    pub async fn issue_password_reset(
        &self,
        user_id: i64,
        email: &str,
    ) -> Result<VerificationToken> {
        self.issue(TokenPurpose::PasswordReset, Some(user_id), email, None)
            .await
    }

    /// Issue an email-change token carrying the requested new address.
    pub async fn issue_email_change(
        &self,
        user_id: i64,
        current_email: &str,
        new_email: &str,
    ) -> Result<VerificationToken> {
        self.issue(
            TokenPurpose::EmailChange,
            Some(user_id),
            current_email,
            Some(new_email),
        )
        .await
    }

    /// Look up a token by value and purpose.
    ///
    /// Returns `None` for an unknown value, a purpose mismatch, or an expired
    /// token. Verification never deletes: an expired token keeps answering
    /// `None` until the cleanup sweep removes it, and a valid token stays
    /// redeemable until [`consume`](Self::consume) is called.
    pub async fn verify(
        &self,
        value: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<VerificationToken>> {
        let repo = VerificationTokenRepository::new(self.pool);
        let Some(token) = repo.get_by_token(value).await? else {
            return Ok(None);
        };

        if token.purpose() != Some(purpose) {
            return Ok(None);
        }

        // An unparseable expiry is treated as expired
        let Some(expires_at) = parse_timestamp(&token.expires_at) else {
            return Ok(None);
        };
        if self.clock.now() > expires_at {
            debug!(token_id = token.id, "Token expired");
            return Ok(None);
        }

        Ok(Some(token))
    }

    /// Consume a token, making it unredeemable. Idempotent.
    pub async fn consume(&self, value: &str) -> Result<()> {
        let deleted = VerificationTokenRepository::new(self.pool)
            .delete_by_token(value)
            .await?;
        if deleted > 0 {
            debug!("Consumed verification token");
        }
        Ok(())
    }

    /// Delete all expired tokens. Returns the number removed.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let now = format_timestamp(&self.clock.now());
        let removed = VerificationTokenRepository::new(self.pool)
            .delete_expired(&now)
            .await?;
        if removed > 0 {
            info!(removed, "Cleaned up expired verification tokens");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::{Database, NewUser, UserRepository};

    async fn setup() -> (Database, Arc<ManualClock>) {
        let db = Database::open_in_memory().await.unwrap();
        let clock = Arc::new(ManualClock::starting_now());
        (db, clock)
    }

    async fn create_user(db: &Database, username: &str, email: &str) -> i64 {
        UserRepository::new(db.pool())
            .create(&NewUser::new(username, email, "hash"))
            .await
            .unwrap()
            .id
    }

    fn service<'a>(db: &'a Database, clock: &Arc<ManualClock>) -> TokenService<'a> {
        TokenService::new(db.pool(), clock.clone(), TokenTtls::default())
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let issued = tokens.issue_email_verification("a@x.com").await.unwrap();
        assert!(issued.token.len() >= 32);

        let found = tokens
            .verify(&issued.token, TokenPurpose::EmailVerify)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_verify_wrong_purpose() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let issued = tokens.issue_email_verification("a@x.com").await.unwrap();
        let found = tokens
            .verify(&issued.token, TokenPurpose::PasswordReset)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_verify_unknown_value() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let found = tokens
            .verify("no-such-token", TokenPurpose::EmailVerify)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_verify_does_not_consume() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let issued = tokens.issue_email_verification("a@x.com").await.unwrap();
        for _ in 0..3 {
            assert!(tokens
                .verify(&issued.token, TokenPurpose::EmailVerify)
                .await
                .unwrap()
                .is_some());
        }
    }

    #[tokio::test]
    async fn test_expired_token_stays_but_never_verifies() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let issued = tokens.issue_email_verification("a@x.com").await.unwrap();
        clock.advance(Duration::hours(25));

        // Repeated verification of the expired token keeps returning None
        for _ in 0..2 {
            assert!(tokens
                .verify(&issued.token, TokenPurpose::EmailVerify)
                .await
                .unwrap()
                .is_none());
        }

        // The row itself is still there until cleanup runs
        let repo = VerificationTokenRepository::new(db.pool());
        assert!(repo.get_by_token(&issued.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reset_ttl_is_shorter() {
        let (db, clock) = setup().await;
        let alice = create_user(&db, "alice", "a@x.com").await;
        let tokens = service(&db, &clock);

        let reset = tokens.issue_password_reset(alice, "a@x.com").await.unwrap();
        let verify = tokens.issue_email_verification("b@x.com").await.unwrap();

        clock.advance(Duration::hours(2));

        assert!(tokens
            .verify(&reset.token, TokenPurpose::PasswordReset)
            .await
            .unwrap()
            .is_none());
        assert!(tokens
            .verify(&verify.token, TokenPurpose::EmailVerify)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_issue_supersedes_previous() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let first = tokens.issue_email_verification("a@x.com").await.unwrap();
        let second = tokens.issue_email_verification("a@x.com").await.unwrap();

        assert!(tokens
            .verify(&first.token, TokenPurpose::EmailVerify)
            .await
            .unwrap()
            .is_none());
        assert!(tokens
            .verify(&second.token, TokenPurpose::EmailVerify)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_supersede_scopes_by_user_for_resets() {
        let (db, clock) = setup().await;
        let alice_id = create_user(&db, "alice", "a@x.com").await;
        let bob_id = create_user(&db, "bobby", "b@x.com").await;
        let tokens = service(&db, &clock);

        let alice = tokens.issue_password_reset(alice_id, "a@x.com").await.unwrap();
        let bob = tokens.issue_password_reset(bob_id, "b@x.com").await.unwrap();
        let alice2 = tokens.issue_password_reset(alice_id, "a@x.com").await.unwrap();

        assert!(tokens
            .verify(&alice.token, TokenPurpose::PasswordReset)
            .await
            .unwrap()
            .is_none());
        assert!(tokens
            .verify(&alice2.token, TokenPurpose::PasswordReset)
            .await
            .unwrap()
            .is_some());
        assert!(tokens
            .verify(&bob.token, TokenPurpose::PasswordReset)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_consume_is_idempotent() {
        let (db, clock) = setup().await;
        let tokens = service(&db, &clock);

        let issued = tokens.issue_email_verification("a@x.com").await.unwrap();
        tokens.consume(&issued.token).await.unwrap();
        tokens.consume(&issued.token).await.unwrap();

        assert!(tokens
            .verify(&issued.token, TokenPurpose::EmailVerify)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_only_removes_expired() {
        let (db, clock) = setup().await;
        let alice = create_user(&db, "alice", "a@x.com").await;
        let tokens = service(&db, &clock);

        tokens.issue_password_reset(alice, "a@x.com").await.unwrap();
        let fresh = tokens.issue_email_verification("b@x.com").await.unwrap();

        clock.advance(Duration::hours(2));
        let removed = tokens.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(tokens
            .verify(&fresh.token, TokenPurpose::EmailVerify)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_email_change_carries_payload() {
        let (db, clock) = setup().await;
        let user_id = create_user(&db, "alice", "old@x.com").await;
        let tokens = service(&db, &clock);

        let issued = tokens
            .issue_email_change(user_id, "old@x.com", "new@x.com")
            .await
            .unwrap();
        let found = tokens
            .verify(&issued.token, TokenPurpose::EmailChange)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "old@x.com");
        assert_eq!(found.new_email.as_deref(), Some("new@x.com"));
    }

    #[tokio::test]
    async fn test_generated_values_are_distinct() {
        let a = TokenService::generate_value();
        let b = TokenService::generate_value();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
