//! Input validation for registration and credential changes.

use thiserror::Error;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username doesn't meet requirements.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Email doesn't meet requirements.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// Password doesn't meet requirements.
    #[error("invalid password: {0}")]
    InvalidPassword(String),
}

/// Usernames that are never available for registration.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "support",
    "teacher",
    "staff",
    "gradetrack",
];

/// Validate a username.
///
/// Rules: 4-16 characters, alphanumeric and underscore only, not reserved.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < 4 || username.len() > 16 {
        return Err(ValidationError::InvalidUsername(
            "username must be 4-16 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidUsername(
            "username may only contain letters, digits, and underscores".to_string(),
        ));
    }

    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(ValidationError::InvalidUsername(
            "username is reserved".to_string(),
        ));
    }

    Ok(())
}

/// Validate an email address format.
///
/// A pragmatic check: one `@`, non-empty local part, and a domain with a dot.
/// Ownership is proven by the verification token, not by this check.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "email must be 1-254 characters".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "email must contain exactly one @".to_string(),
        ));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "email must contain exactly one @".to_string(),
        ));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "email domain is malformed".to_string(),
        ));
    }

    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::InvalidEmail(
            "email must not contain whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Validate password complexity.
///
/// Rules: more than 7 characters, with at least one uppercase letter, one
/// lowercase letter, one digit, and one symbol.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() <= 7 {
        return Err(ValidationError::InvalidPassword(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if !has_upper {
        return Err(ValidationError::InvalidPassword(
            "password must contain an uppercase letter".to_string(),
        ));
    }
    if !has_lower {
        return Err(ValidationError::InvalidPassword(
            "password must contain a lowercase letter".to_string(),
        ));
    }
    if !has_digit {
        return Err(ValidationError::InvalidPassword(
            "password must contain a digit".to_string(),
        ));
    }
    if !has_symbol {
        return Err(ValidationError::InvalidPassword(
            "password must contain a symbol".to_string(),
        ));
    }

    Ok(())
}

/// Validate all registration fields at once.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert!(validate_username("user").is_ok());
        assert!(validate_username("student_42").is_ok());
        assert!(validate_username("a2345678901234b6").is_ok());
    }

    #[test]
    fn test_username_length() {
        assert!(validate_username("abc").is_err());
        assert!(validate_username("a2345678901234b67").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("user name").is_err());
        assert!(validate_username("user-name").is_err());
        assert!(validate_username("user@name").is_err());
    }

    #[test]
    fn test_username_reserved() {
        assert!(validate_username("admin").is_err());
        assert!(validate_username("Admin").is_err());
        assert!(validate_username("ROOT").is_err());
        assert!(validate_username("teacher").is_err());
    }

    #[test]
    fn test_valid_email() {
        assert!(validate_email("student@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("user name@example.com").is_err());
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("Str0ng#Secret").is_ok());
    }

    #[test]
    fn test_password_too_short() {
        // Exactly 7 characters is rejected, 8 with all classes passes
        assert!(validate_password("Pa0!aaa").is_err());
        assert!(validate_password("Pa0!aaaa").is_ok());
    }

    #[test]
    fn test_password_missing_classes() {
        assert!(validate_password("passw0rd!").is_err()); // no uppercase
        assert!(validate_password("PASSW0RD!").is_err()); // no lowercase
        assert!(validate_password("Password!").is_err()); // no digit
        assert!(validate_password("Passw0rd").is_err()); // no symbol
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration("student", "s@example.com", "Passw0rd!").is_ok());
        assert!(matches!(
            validate_registration("ab", "s@example.com", "Passw0rd!"),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_registration("student", "bad-email", "Passw0rd!"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_registration("student", "s@example.com", "weak"),
            Err(ValidationError::InvalidPassword(_))
        ));
    }
}
