//! Token Entity
//!
//! Opaque server-side token. The random value travels to the client (inside
//! the encrypted auth cookie, or in a reset link); everything else stays in
//! the token store.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::net::IpAddr;

use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Random bytes per token value (encoded as 43 URL-safe Base64 chars)
pub const TOKEN_VALUE_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Backs a login session cookie
    Authentication,
    /// Single-use password reset link
    PasswordReset,
}

impl TokenType {
    /// Persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Authentication => "authentication",
            TokenType::PasswordReset => "password_reset",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "authentication" => Some(TokenType::Authentication),
            "password_reset" => Some(TokenType::PasswordReset),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub user_id: UserId,
    /// Address the token was issued to, kept for auditing
    pub ip_address: Option<String>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Mint a token with a fresh random value, valid for `lifetime` from `now`.
    pub fn issue(
        user_id: UserId,
        token_type: TokenType,
        ip_address: Option<IpAddr>,
        lifetime: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<Self> {
        if lifetime <= Duration::zero() {
            return Err(AuthError::Internal(format!(
                "{} token lifetime must be positive",
                token_type
            )));
        }

        let value = platform::crypto::random_token(TOKEN_VALUE_BYTES)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Self {
            value,
            token_type,
            user_id,
            ip_address: ip_address.map(|ip| ip.to_string()),
            valid_until: now + lifetime,
            created_at: now,
        })
    }

    pub fn is_valid_at(&self, expected: TokenType, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && self.token_type == expected && now <= self.valid_until
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("user_id", &self.user_id)
            .field("ip_address", &self.ip_address)
            .field("valid_until", &self.valid_until)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Whether a looked-up token may be honored.
///
/// True only if the token exists, has a non-empty value, has the expected
/// type, and `now` is not after `valid_until`. The boundary instant itself
/// is still valid. Expiry is a `false`, never an error.
pub fn validate_token(token: Option<&Token>, expected: TokenType, now: DateTime<Utc>) -> bool {
    token.is_some_and(|token| token.is_valid_at(expected, now))
}
