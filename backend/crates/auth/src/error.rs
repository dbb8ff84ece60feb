//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use platform::secure_cookie::SecureCookieError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-up with an e-mail that is already registered
    #[error("User already exists")]
    UserExists,

    /// Unknown e-mail or wrong password; the two are never distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Configured cookie key string cannot be parsed
    #[error("Invalid secure cookie key")]
    InvalidSecureCookieKey(#[source] SecureCookieError),

    /// Auth cookie present but not decodable under any configured key
    #[error("Invalid authentication cookie")]
    InvalidCookie(#[source] SecureCookieError),

    /// Cookie value could not be produced
    #[error("Failed to encode authentication cookie")]
    CookieEncoding(#[source] SecureCookieError),

    /// Missing, expired or consumed reset token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token value collision in the store
    #[error("Token already exists")]
    TokenExists,

    /// Password reset requested for an unknown e-mail.
    /// Callers should answer exactly as on success.
    #[error("Email is not registered")]
    UnregisteredEmail,

    /// Route needs a logged-in user
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserExists | AuthError::TokenExists => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::InvalidCookie(_)
            | AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::InvalidToken => ErrorKind::Gone,
            AuthError::UnregisteredEmail => ErrorKind::NotFound,
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidSecureCookieKey(_)
            | AuthError::CookieEncoding(_)
            | AuthError::PasswordHash(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Client-facing form. Server faults carry only the reason phrase.
    pub fn to_app_error(&self) -> AppError {
        let kind = self.kind();
        if kind.is_server_error() {
            return AppError::from_kind(kind);
        }
        let err = AppError::new(kind, self.to_string());
        match self.action() {
            Some(action) => err.with_action(action),
            None => err,
        }
    }

    /// What the user can do about it, when there is something to do.
    fn action(&self) -> Option<&'static str> {
        match self {
            AuthError::UserExists => Some("Log in instead"),
            AuthError::InvalidCredentials => Some("Check your e-mail and password"),
            AuthError::InvalidCookie(_) | AuthError::Unauthenticated => Some("Log in to continue"),
            AuthError::InvalidToken => Some("Request a new password reset link"),
            _ => None,
        }
    }

    /// Log once at the boundary, at a level matching the failure.
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::PasswordHash(e) => {
                tracing::error!(error = %e, "Password hashing error");
            }
            AuthError::InvalidSecureCookieKey(e) | AuthError::CookieEncoding(e) => {
                tracing::error!(error = %e, "Secure cookie configuration error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidCookie(e) => {
                tracing::warn!(error = %e, "Rejected authentication cookie");
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
