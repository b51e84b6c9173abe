//! Authentication and authorization logic.
//!
//! Provides password hashing, JWT management, and the credential store
//! queries used by `tasker_api`.

pub mod jwt;
pub mod password;
pub mod queries;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Username length bounds, in characters.
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;

/// Minimum password length, in characters.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Check registration input before touching the store.
pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AuthError::ValidationError(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }
    if !is_valid_email(email) {
        return Err(AuthError::ValidationError("Invalid email address".into()));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AuthError::ValidationError(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    Ok(())
}

/// Shape check only: `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_registration() {
        assert!(validate_registration("testuser", "test@example.com", "strongpassword123").is_ok());
    }

    #[test]
    fn rejects_short_or_long_username() {
        assert!(validate_registration("ab", "a@example.com", "strongpassword123").is_err());
        let long = "u".repeat(USERNAME_MAX_LEN + 1);
        assert!(validate_registration(&long, "a@example.com", "strongpassword123").is_err());
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_registration("testuser", "a@example.com", "short").unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@example."));
    }
}
