//! # Error Types
//!
//! Error types for the Confido authentication service using `thiserror`.

use std::fmt;

/// Custom result type for Confido operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the authentication service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Authentication errors
    #[error("Authentication error: {message}")]
    Auth { message: String, error_type: AuthErrorType },

    /// Resource conflict errors (e.g., email already registered)
    #[error("Resource conflict: {message}")]
    Conflict { message: String, resource_type: String },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Outbound mail delivery errors
    #[error("Mail delivery error: {message}")]
    Mail { message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Authentication error subtypes.
///
/// Bearer and refresh token failures share `InvalidToken`/`ExpiredToken`; the
/// reset flow has its own kinds because they surface as 400 rather than 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorType {
    InvalidCredentials,
    AccountDisabled,
    InvalidToken,
    ExpiredToken,
    InvalidResetToken,
    ExpiredResetToken,
    AccountNotFoundForReset,
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorType::InvalidCredentials => write!(f, "invalid_credentials"),
            AuthErrorType::AccountDisabled => write!(f, "account_disabled"),
            AuthErrorType::InvalidToken => write!(f, "invalid_token"),
            AuthErrorType::ExpiredToken => write!(f, "expired_token"),
            AuthErrorType::InvalidResetToken => write!(f, "invalid_reset_token"),
            AuthErrorType::ExpiredResetToken => write!(f, "expired_reset_token"),
            AuthErrorType::AccountNotFoundForReset => write!(f, "account_not_found_for_reset"),
        }
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S, error_type: AuthErrorType) -> Self {
        Self::Auth { message: message.into(), error_type }
    }

    /// Create a conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a mail delivery error
    pub fn mail<S: Into<String>>(message: S) -> Self {
        Self::Mail { message: message.into() }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create an internal error that keeps its cause for logging
    pub fn internal_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(source) }
    }

    /// Authentication subtype, if this is an authentication error
    pub fn auth_error_type(&self) -> Option<AuthErrorType> {
        match self {
            Error::Auth { error_type, .. } => Some(*error_type),
            _ => None,
        }
    }

    /// Whether the error is the given authentication subtype
    pub fn is_auth(&self, kind: AuthErrorType) -> bool {
        self.auth_error_type() == Some(kind)
    }

    /// Whether the error came from a unique constraint violation in the store
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database { source, .. } => source
                .as_database_error()
                .map(|db_err| db_err.is_unique_violation())
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        Self::internal_with_source("Token encoding failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let first_field = fields.first().map(|(field, _)| field.to_string());
        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation { message, field: first_field }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(email(message = "Email must be valid"))]
        email: String,
    }

    #[test]
    fn test_error_creation() {
        let error = Error::config("Test configuration error");
        assert!(matches!(error, Error::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: Test configuration error");
    }

    #[test]
    fn test_config_error_keeps_source() {
        let cause = "not-an-address".parse::<std::net::SocketAddr>().unwrap_err();
        let error = Error::config_with_source("Invalid metrics bind address", Box::new(cause));
        assert_eq!(error.to_string(), "Configuration error: Invalid metrics bind address");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_validation_error_keeps_field() {
        let error = Error::validation_field("Invalid email format", "email");
        if let Error::Validation { field, .. } = error {
            assert_eq!(field, Some("email".to_string()));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_auth_error_type_lookup() {
        let error = Error::auth("Invalid token", AuthErrorType::InvalidToken);
        assert!(error.is_auth(AuthErrorType::InvalidToken));
        assert!(!error.is_auth(AuthErrorType::ExpiredToken));
        assert_eq!(Error::internal("boom").auth_error_type(), None);
    }

    #[test]
    fn test_validator_errors_convert_with_field_message() {
        let errors = Signup { email: "not-an-email".into() }.validate().unwrap_err();
        let error: Error = errors.into();
        match error {
            Error::Validation { message, field } => {
                assert_eq!(field.as_deref(), Some("email"));
                assert_eq!(message, "email: Email must be valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_auth_error_type_display() {
        assert_eq!(AuthErrorType::InvalidCredentials.to_string(), "invalid_credentials");
        assert_eq!(AuthErrorType::ExpiredResetToken.to_string(), "expired_reset_token");
        assert_eq!(
            AuthErrorType::AccountNotFoundForReset.to_string(),
            "account_not_found_for_reset"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io { .. }));
    }
}
