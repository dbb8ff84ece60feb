//! Error Kind
//!
//! Closed classification of every failure the backend can report.

use serde::Serialize;

/// Classification of an error, mapped one-to-one onto an HTTP status.
///
/// Domain crates translate their own error enums into one of these kinds;
/// the kind alone decides the status code and whether the failure is logged
/// as a server fault.
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::Conflict.status_code(), 409);
/// assert!(ErrorKind::InternalServerError.is_server_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed or invalid input.
    BadRequest,
    /// Missing or wrong credentials.
    Unauthorized,
    NotFound,
    /// Uniqueness or state conflict, e.g. an e-mail that is already registered.
    Conflict,
    /// Resource existed but is no longer usable (consumed reset tokens).
    Gone,
    InternalServerError,
}

impl ErrorKind {
    const fn status_and_reason(&self) -> (u16, &'static str) {
        match self {
            ErrorKind::BadRequest => (400, "Bad Request"),
            ErrorKind::Unauthorized => (401, "Unauthorized"),
            ErrorKind::NotFound => (404, "Not Found"),
            ErrorKind::Conflict => (409, "Conflict"),
            ErrorKind::Gone => (410, "Gone"),
            ErrorKind::InternalServerError => (500, "Internal Server Error"),
        }
    }

    /// HTTP status code for this kind.
    #[inline]
    pub const fn status_code(&self) -> u16 {
        self.status_and_reason().0
    }

    /// Standard reason phrase.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.status_and_reason().1
    }

    /// 5xx kinds. Their details must never reach the client.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    #[inline]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.status_code(), 400..=499)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
