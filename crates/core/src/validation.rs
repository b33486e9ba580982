//! Login and registration form rules.
//!
//! These run before any request reaches the backend.

use thiserror::Error;

/// Minimum length for usernames and passwords.
pub const MIN_CREDENTIAL_LENGTH: usize = 6;

/// A form field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username is a required field")]
    UsernameRequired,

    #[error("Username must be at least 6 characters")]
    UsernameTooShort,

    #[error("Password is a required field")]
    PasswordRequired,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Validate a registration form.
///
/// # Errors
///
/// Returns the first failing rule, checking the username before the password.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired);
    }
    if username.chars().count() < MIN_CREDENTIAL_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < MIN_CREDENTIAL_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Validate a login form.
///
/// # Errors
///
/// Returns an error if either field is empty.
pub const fn validate_login(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired);
    }
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_rules_in_order() {
        assert_eq!(
            validate_registration("", "", ""),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            validate_registration("bob", "secret123", "secret123"),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            validate_registration("crio.do", "", ""),
            Err(ValidationError::PasswordRequired)
        );
        assert_eq!(
            validate_registration("crio.do", "abc", "abc"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_registration("crio.do", "learnbydoing", "learnbydo1ng"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(validate_registration("crio.do", "learnbydoing", "learnbydoing").is_ok());
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert_eq!(
            validate_login("", "pw"),
            Err(ValidationError::UsernameRequired)
        );
        assert_eq!(
            validate_login("user", ""),
            Err(ValidationError::PasswordRequired)
        );
        assert!(validate_login("user", "pw").is_ok());
    }
}
