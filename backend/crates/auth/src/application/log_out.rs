//! Log Out

use axum_extra::extract::cookie::{Cookie, CookieJar};
use platform::secure_cookie::SecureCookieError;

use crate::application::authentication::Authentication;
use crate::domain::entity::token::TokenType;
use crate::domain::repository::{TokenStore, UserStore};
use crate::error::AuthError;

/// Outcome of [`Authentication::log_out`].
///
/// `cookie` is always the expired auth cookie and should be written to the
/// response even when `error` is set.
#[derive(Debug)]
pub struct LoggedOut {
    pub cookie: Cookie<'static>,
    pub error: Option<AuthError>,
}

impl<U, T> Authentication<U, T>
where
    U: UserStore,
    T: TokenStore,
{
    /// Revoke the session named by the request's auth cookie.
    ///
    /// Without an auth cookie this is a no-op. Deleting an already deleted
    /// token succeeds, so repeated log-outs are harmless.
    pub async fn log_out(&self, jar: &CookieJar) -> LoggedOut {
        let now = self.now();
        let cookie = self.cookies.expired(now);

        let Some(encoded) = self.auth_cookie_value(jar) else {
            return LoggedOut {
                cookie,
                error: None,
            };
        };

        let value: String = match self.codec.decode_at(encoded, now) {
            Ok(value) => value,
            // The token behind it has expired too
            Err(SecureCookieError::Expired) => {
                return LoggedOut {
                    cookie,
                    error: None,
                };
            }
            Err(e) => {
                return LoggedOut {
                    cookie,
                    error: Some(AuthError::InvalidCookie(e)),
                };
            }
        };

        let error = self
            .tokens
            .delete(&value, TokenType::Authentication)
            .await
            .err();

        if error.is_none() {
            tracing::info!("User logged out");
        }

        LoggedOut { cookie, error }
    }
}
