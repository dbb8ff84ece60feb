//! Authentication façade
//!
//! Owns the stores, the cookie codec, the password hasher and the clock.
//! Operations are implemented in the sibling modules.

use std::net::IpAddr;
use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Duration, Utc};
use platform::clock::{Clock, SystemClock};
use platform::cookie::CookiePolicy;
use platform::crypto::random_token;
use platform::password::{
    BoundedHasher, ClearTextPassword, HashedPassword, PasswordHashError, PasswordHasher,
};
use platform::secure_cookie::{CookieKeyPair, SecureCookieCodec};

use crate::application::config::AuthConfig;
use crate::domain::entity::token::{Token, TokenType};
use crate::domain::entity::user::User;
use crate::domain::repository::{TokenStore, UserStore};
use crate::error::{AuthError, AuthResult};

/// Result of a successful sign-up or log-in.
#[derive(Debug)]
pub struct SignedIn {
    pub user: User,
    /// Authentication cookie to set on the response
    pub cookie: Cookie<'static>,
}

pub struct Authentication<U, T> {
    pub(crate) users: Arc<U>,
    pub(crate) tokens: Arc<T>,
    pub(crate) config: Arc<AuthConfig>,
    pub(crate) codec: SecureCookieCodec,
    pub(crate) cookies: CookiePolicy,
    pub(crate) hasher: BoundedHasher,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) token_lifetime: Duration,
    pub(crate) reset_token_lifetime: Duration,
    /// Verified against when the e-mail is unknown, so that both log-in
    /// failures cost one Argon2 run.
    pub(crate) decoy_hash: HashedPassword,
}

impl<U, T> Authentication<U, T>
where
    U: UserStore,
    T: TokenStore,
{
    /// Build from configuration.
    ///
    /// Fails with [`AuthError::InvalidSecureCookieKey`] when either cookie
    /// key string is malformed, and with an internal error for unusable
    /// lifetimes or hash parameters.
    pub fn new(users: Arc<U>, tokens: Arc<T>, config: Arc<AuthConfig>) -> AuthResult<Self> {
        let current = CookieKeyPair::from_key_string(&config.current_cookie_key)
            .map_err(AuthError::InvalidSecureCookieKey)?;
        let previous = CookieKeyPair::from_optional_key_string(&config.previous_cookie_key)
            .map_err(AuthError::InvalidSecureCookieKey)?;

        let token_lifetime = positive_duration(config.token_lifetime, "token_lifetime")?;
        let reset_token_lifetime =
            positive_duration(config.reset_token_lifetime, "reset_token_lifetime")?;

        // A cookie never outlives the token it carries
        let codec = SecureCookieCodec::new(config.cookie_name.clone(), current, previous)
            .with_max_age(token_lifetime);

        let cookies = CookiePolicy {
            name: config.cookie_name.clone(),
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
        };

        let hasher = PasswordHasher::new(config.hash_params)?;
        let decoy = random_token(16).map_err(|e| AuthError::Internal(e.to_string()))?;
        let decoy_hash = hasher.hash(&ClearTextPassword::new(decoy))?;
        let hasher = BoundedHasher::new(hasher, config.max_concurrent_hashes);

        tracing::debug!(
            cookie_name = %config.cookie_name,
            previous_key = codec.has_previous(),
            max_concurrent_hashes = hasher.max_concurrent(),
            "Authentication initialized"
        );

        Ok(Self {
            users,
            tokens,
            config,
            codec,
            cookies,
            hasher,
            clock: Arc::new(SystemClock),
            token_lifetime,
            reset_token_lifetime,
            decoy_hash,
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cookie_name(&self) -> &str {
        self.codec.name()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Value of the auth cookie, if the request carries a non-empty one.
    pub(crate) fn auth_cookie_value<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(self.codec.name())
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    }

    /// Mint and persist an authentication token, then wrap it in a cookie.
    ///
    /// With `remember_me` the cookie persists until the token expires;
    /// otherwise it lives for the browser session. The token lifetime is the
    /// same either way.
    pub(crate) async fn open_session(
        &self,
        user: &User,
        ip: Option<IpAddr>,
        remember_me: bool,
        now: DateTime<Utc>,
    ) -> AuthResult<Cookie<'static>> {
        let token = Token::issue(
            user.user_id,
            TokenType::Authentication,
            ip,
            self.token_lifetime,
            now,
        )?;
        self.tokens.create(&token).await?;

        match self.codec.encode_at(token.value.as_str(), now) {
            Ok(encoded) if remember_me => Ok(self.cookies.issue(encoded, now, token.valid_until)),
            Ok(encoded) => Ok(self.cookies.issue_session(encoded)),
            Err(e) => {
                if let Err(cleanup) = self
                    .tokens
                    .delete(&token.value, TokenType::Authentication)
                    .await
                {
                    tracing::warn!(error = %cleanup, "Failed to remove orphaned token");
                }
                Err(AuthError::CookieEncoding(e))
            }
        }
    }

    /// Hash a new password. Blank passwords are rejected.
    pub(crate) async fn hash_password(&self, raw: String) -> AuthResult<HashedPassword> {
        let password = ClearTextPassword::new(raw);
        if password.is_blank() {
            return Err(AuthError::Validation("Password cannot be empty".to_string()));
        }
        Ok(self.hasher.hash(password).await?)
    }

    /// A stored hash that cannot be used is logged and counts as a mismatch.
    pub(crate) async fn verify_password(
        &self,
        password: ClearTextPassword,
        hashed: &HashedPassword,
    ) -> AuthResult<bool> {
        match self.hasher.verify(password, hashed.clone()).await {
            Ok(matches) => Ok(matches),
            Err(e @ (PasswordHashError::InvalidHashFormat | PasswordHashError::Unsupported(_))) => {
                tracing::warn!(error = %e, "Stored password hash is unusable");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn positive_duration(value: std::time::Duration, field: &str) -> AuthResult<Duration> {
    Duration::from_std(value)
        .ok()
        .filter(|d| *d > Duration::zero())
        .ok_or_else(|| AuthError::Internal(format!("{} must be a positive duration", field)))
}
