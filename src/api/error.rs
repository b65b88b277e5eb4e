use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::error;

use crate::errors::{AuthErrorType, Error};

/// Every failure the HTTP surface can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadCredentials,
    AccountLocked,
    InvalidToken,
    InvalidResetToken,
    ExpiredResetToken,
    Validation,
    AccessDenied,
    BadRequest,
    NotFound,
    Internal,
}

impl ErrorKind {
    fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::BadCredentials | ErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorKind::AccountLocked | ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
            ErrorKind::InvalidResetToken
            | ErrorKind::ExpiredResetToken
            | ErrorKind::Validation
            | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ErrorKind::BadCredentials => "Authentication Failed",
            ErrorKind::AccountLocked => "Account Locked",
            ErrorKind::InvalidToken => "Invalid Token",
            ErrorKind::InvalidResetToken => "Invalid Reset Token",
            ErrorKind::ExpiredResetToken => "Expired Reset Token",
            ErrorKind::Validation => "Validation Error",
            ErrorKind::AccessDenied => "Access Denied",
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Internal => "Internal Server Error",
        }
    }

    /// Client-facing text for kinds whose message never varies.
    fn fixed_message(&self) -> Option<&'static str> {
        match self {
            ErrorKind::BadCredentials => Some("The username or password is incorrect"),
            ErrorKind::AccountLocked => Some("The account is locked"),
            ErrorKind::InvalidToken => Some("The token is invalid or has expired"),
            ErrorKind::InvalidResetToken => Some("Invalid reset token"),
            ErrorKind::ExpiredResetToken => Some("Reset token has expired"),
            ErrorKind::AccessDenied => Some("You are not authorized to access this resource"),
            ErrorKind::NotFound => Some("Resource not found"),
            ErrorKind::Internal => Some("Unknown internal server error"),
            ErrorKind::Validation | ErrorKind::BadRequest => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

/// Problem-object body shared by every error response.
#[derive(Debug, Serialize)]
pub struct ProblemBody {
    pub status: u16,
    pub title: &'static str,
    pub detail: String,
    pub timestamp: String,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.fixed_message().unwrap_or(kind.title()).to_string();
        Self { kind, message }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self { kind: ErrorKind::Validation, message: message.into() }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self { kind: ErrorKind::BadRequest, message: message.into() }
    }

    pub fn access_denied() -> Self {
        Self::new(ErrorKind::AccessDenied)
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub fn body(&self) -> ProblemBody {
        ProblemBody {
            status: self.status_code().as_u16(),
            title: self.kind.title(),
            detail: self.message.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: self.message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth { error_type, .. } => match error_type {
                AuthErrorType::InvalidCredentials => ApiError::new(ErrorKind::BadCredentials),
                AuthErrorType::AccountDisabled => ApiError::new(ErrorKind::AccountLocked),
                AuthErrorType::InvalidToken | AuthErrorType::ExpiredToken => {
                    ApiError::invalid_token()
                }
                AuthErrorType::InvalidResetToken => ApiError::new(ErrorKind::InvalidResetToken),
                AuthErrorType::ExpiredResetToken => ApiError::new(ErrorKind::ExpiredResetToken),
                AuthErrorType::AccountNotFoundForReset => {
                    // Must be masked by the service layer before reaching HTTP.
                    error!(error_type = %error_type, "unmasked reset lookup failure");
                    ApiError::internal()
                }
            },
            Error::Validation { message, .. } => ApiError::validation(message),
            Error::Conflict { message, .. } => ApiError::bad_request(message),
            Error::NotFound { .. } => ApiError::not_found(),
            err @ (Error::Config { .. }
            | Error::Database { .. }
            | Error::Io { .. }
            | Error::Mail { .. }
            | Error::Internal { .. }) => {
                error!(error = %err, source = ?std::error::Error::source(&err), "request failed");
                ApiError::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}
