//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::adapter::AdapterError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email already registered
    #[error("User already exists")]
    UserAlreadyExists,

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Wrong current password on a password-protected action
    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid email")]
    InvalidEmail,

    /// Reset token unknown or expired
    #[error("Invalid token")]
    InvalidToken,

    /// Session cookie missing, forged or expired
    #[error("Unauthorized")]
    SessionInvalid,

    #[error("User not found")]
    UserNotFound,

    #[error("Prompt not found")]
    PromptNotFound,

    /// Password policy violation
    #[error("{0}")]
    PasswordValidation(String),

    /// Malformed request field
    #[error("{0}")]
    InvalidInput(String),

    #[error("Cannot remove the last authentication method")]
    LastAuthMethod,

    #[error("Dev login is disabled")]
    DevLoginDisabled,

    /// Data access failure
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserAlreadyExists => ErrorKind::UnprocessableEntity,
            AuthError::InvalidCredentials | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::InvalidPassword
            | AuthError::InvalidEmail
            | AuthError::InvalidToken
            | AuthError::PasswordValidation(_)
            | AuthError::InvalidInput(_)
            | AuthError::LastAuthMethod => ErrorKind::BadRequest,
            AuthError::UserNotFound | AuthError::PromptNotFound => ErrorKind::NotFound,
            AuthError::DevLoginDisabled => ErrorKind::Forbidden,
            AuthError::Adapter(AdapterError::Transport(_)) => ErrorKind::ServiceUnavailable,
            AuthError::Adapter(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::InvalidCredentials => "INVALID_EMAIL_OR_PASSWORD",
            AuthError::InvalidPassword => "INVALID_PASSWORD",
            AuthError::InvalidEmail => "INVALID_EMAIL",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::SessionInvalid => "UNAUTHORIZED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::PromptNotFound => "PROMPT_NOT_FOUND",
            AuthError::PasswordValidation(_) => "INVALID_PASSWORD_FORMAT",
            AuthError::InvalidInput(_) => "INVALID_INPUT",
            AuthError::LastAuthMethod => "LAST_AUTH_METHOD",
            AuthError::DevLoginDisabled => "DEV_LOGIN_DISABLED",
            AuthError::Adapter(_) | AuthError::Internal(_) => self.kind().code(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string()).with_code(self.code())
    }

    /// Same message and code, answered with a fixed status
    pub fn to_app_error_as(&self, kind: ErrorKind) -> AppError {
        AppError::new(kind, self.to_string()).with_code(self.code())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::Adapter(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Invalid or expired reset token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::UserAlreadyExists.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::from(AdapterError::Query("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::from(AdapterError::Transport("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(
            AuthError::from(AdapterError::Query("Failed to create record".into())).to_string(),
            "Failed to create record"
        );
    }

    #[test]
    fn test_to_app_error_as() {
        let err = AuthError::SessionInvalid.to_app_error_as(ErrorKind::BadRequest);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
