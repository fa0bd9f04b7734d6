//! User model for GradeTrack.

/// User entity representing a registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Email address (normalized lowercase).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Account creation timestamp.
    pub created_at: String,
    /// Soft delete timestamp (None while the account is active).
    pub deleted_at: Option<String>,
}

impl User {
    /// Check if the account has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if the account is active.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address (normalized lowercase).
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
}

impl NewUser {
    /// Create a new user record with the required fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "student".to_string(),
            email: "student@example.com".to_string(),
            password: "$argon2id$...".to_string(),
            email_verified: false,
            created_at: "2026-01-01 00:00:00".to_string(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_active_user() {
        let user = sample_user();
        assert!(user.is_active());
        assert!(!user.is_deleted());
    }

    #[test]
    fn test_soft_deleted_user() {
        let mut user = sample_user();
        user.deleted_at = Some("2026-02-01 00:00:00".to_string());
        assert!(user.is_deleted());
        assert!(!user.is_active());
    }

    #[test]
    fn test_new_user() {
        let new_user = NewUser::new("student", "student@example.com", "hash");
        assert_eq!(new_user.username, "student");
        assert_eq!(new_user.email, "student@example.com");
        assert_eq!(new_user.password, "hash");
    }
}
