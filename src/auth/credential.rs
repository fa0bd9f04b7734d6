//! Credential store for GradeTrack.
//!
//! Wraps password hashing and the stored hash lifecycle behind one type.
//! Rotation replaces the hash and leaves session teardown to the caller, so
//! flows decide what a credential change invalidates.

use tracing::info;

use super::password::{hash_password, verify_password, HashParams};
use crate::db::{DbPool, UserRepository};
use crate::{GradetrackError, Result};

/// Stores and checks password credentials.
pub struct CredentialStore<'a> {
    pool: &'a DbPool,
    params: HashParams,
}

impl<'a> CredentialStore<'a> {
    /// Create a store over the given pool with the given hashing parameters.
    pub fn new(pool: &'a DbPool, params: HashParams) -> Self {
        Self { pool, params }
    }

    /// Hash a plaintext password for storage.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        hash_password(plaintext, &self.params).map_err(|e| GradetrackError::Auth(e.to_string()))
    }

    /// Check a plaintext password against a user's stored hash.
    ///
    /// Returns false for a wrong password and for unknown users; only
    /// infrastructure failures surface as errors.
    pub async fn verify(&self, user_id: i64, plaintext: &str) -> Result<bool> {
        let Some(user) = UserRepository::new(self.pool).get_by_id(user_id).await? else {
            return Ok(false);
        };

        Ok(verify_password(plaintext, &user.password))
    }

    /// Replace a user's stored hash with a hash of `new_plaintext`.
    ///
    /// The caller is responsible for complexity checks and for invalidating
    /// sessions afterwards.
    pub async fn rotate(&self, user_id: i64, new_plaintext: &str) -> Result<()> {
        let hash = self.hash(new_plaintext)?;

        let updated = UserRepository::new(self.pool)
            .update_password(user_id, &hash)
            .await?;
        if !updated {
            return Err(GradetrackError::NotFound("user".to_string()));
        }

        info!(user_id, "Password rotated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser};

    fn fast_params() -> HashParams {
        HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool(), fast_params());
        let hash = store.hash("Passw0rd!").unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("student", "student@example.com", &hash))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_verify_correct_and_wrong() {
        let (db, user_id) = setup().await;
        let store = CredentialStore::new(db.pool(), fast_params());

        assert!(store.verify(user_id, "Passw0rd!").await.unwrap());
        assert!(!store.verify(user_id, "Wrong0ne!").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_unknown_user() {
        let (db, _) = setup().await;
        let store = CredentialStore::new(db.pool(), fast_params());

        assert!(!store.verify(9999, "Passw0rd!").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_replaces_hash() {
        let (db, user_id) = setup().await;
        let store = CredentialStore::new(db.pool(), fast_params());

        store.rotate(user_id, "NewSecret1!").await.unwrap();

        assert!(store.verify(user_id, "NewSecret1!").await.unwrap());
        assert!(!store.verify(user_id, "Passw0rd!").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_unknown_user() {
        let (db, _) = setup().await;
        let store = CredentialStore::new(db.pool(), fast_params());

        let result = store.rotate(9999, "NewSecret1!").await;
        assert!(matches!(result, Err(GradetrackError::NotFound(_))));
    }
}
