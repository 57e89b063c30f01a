//! User value objects and validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Unknown role '{0}'. Expected one of: admin, manager, viewer")]
    UnknownRole(String),
}

impl UserValidationError {
    /// Input field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::EmailTooLong(_) | Self::InvalidEmail(_) => "email",
            Self::EmptyName | Self::NameTooLong(_) => "name",
            Self::PasswordTooShort(_) | Self::PasswordTooLong(_) => "password",
            Self::UnknownRole(_) => "role",
        }
    }
}

impl From<UserValidationError> for DomainError {
    fn from(err: UserValidationError) -> Self {
        DomainError::invalid_field(err.field(), err.to_string())
    }
}

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Email address, trimmed and lower-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }

        if email.len() > MAX_EMAIL_LENGTH {
            return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
        }

        if !EMAIL_PATTERN.is_match(&email) {
            return Err(UserValidationError::InvalidEmail(email));
        }

        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable user name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let name = name.as_ref().trim();

        if name.is_empty() {
            return Err(UserValidationError::EmptyName);
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(UserValidationError::NameTooLong(MAX_NAME_LENGTH));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

/// Validate a plain-text password
///
/// Rules:
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if len > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(Email::new("coach@club.com").is_ok());
        assert!(Email::new("first.last+tag@sub.domain.org").is_ok());
    }

    #[test]
    fn test_email_is_normalized() {
        let email = Email::new("  Coach@Club.COM ").unwrap();
        assert_eq!(email.as_str(), "coach@club.com");
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(Email::new(""), Err(UserValidationError::EmptyEmail));
        assert!(matches!(
            Email::new("no-at-sign.com"),
            Err(UserValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            Email::new("user@nodot"),
            Err(UserValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            Email::new("us er@club.com"),
            Err(UserValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@club.com", "a".repeat(250));
        assert_eq!(Email::new(&email), Err(UserValidationError::EmailTooLong(254)));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(DisplayName::new(" Pep ").unwrap().as_str(), "Pep");
        assert_eq!(DisplayName::new("  "), Err(UserValidationError::EmptyName));
        assert_eq!(
            DisplayName::new("a".repeat(101)),
            Err(UserValidationError::NameTooLong(100))
        );
    }

    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("P@ssw0rd!").is_ok());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_password_too_short() {
        assert_eq!(
            validate_password("1234567"),
            Err(UserValidationError::PasswordTooShort(8))
        );
    }

    #[test]
    fn test_password_too_long() {
        let long_password = "a".repeat(129);
        assert_eq!(
            validate_password(&long_password),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }

    #[test]
    fn test_error_converts_with_field() {
        let err: DomainError = UserValidationError::EmptyEmail.into();

        match err {
            DomainError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("email")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
