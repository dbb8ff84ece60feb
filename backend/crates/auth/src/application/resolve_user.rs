//! Resolve the current user from the request's auth cookie

use axum_extra::extract::cookie::CookieJar;
use platform::secure_cookie::SecureCookieError;

use crate::application::authentication::Authentication;
use crate::domain::entity::token::{TokenType, validate_token};
use crate::domain::entity::user::User;
use crate::domain::repository::{TokenStore, UserStore};
use crate::error::{AuthError, AuthResult};

impl<U, T> Authentication<U, T>
where
    U: UserStore,
    T: TokenStore,
{
    /// `Ok(None)` for anonymous requests: no cookie, an expired cookie or
    /// token, an unknown token, or a token whose user no longer exists.
    ///
    /// A cookie that does not decode under the current or previous key is
    /// reported as [`AuthError::InvalidCookie`].
    pub async fn resolve_user(&self, jar: &CookieJar) -> AuthResult<Option<User>> {
        let Some(encoded) = self.auth_cookie_value(jar) else {
            return Ok(None);
        };

        let now = self.now();
        let value: String = match self.codec.decode_at(encoded, now) {
            Ok(value) => value,
            Err(SecureCookieError::Expired) => return Ok(None),
            Err(e) => return Err(AuthError::InvalidCookie(e)),
        };

        let token = match self.tokens.find(&value, TokenType::Authentication).await? {
            Some(token)
                if token.value == value
                    && validate_token(Some(&token), TokenType::Authentication, now) =>
            {
                token
            }
            _ => return Ok(None),
        };

        self.users.find_by_id(&token.user_id).await
    }
}
