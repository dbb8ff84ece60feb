//! Typed request context
//!
//! [`set_user`](super::middleware::set_user) stores a [`CurrentUser`] in the
//! request extensions; gates and handlers read it back from there.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::http::request::Parts;

use crate::domain::entity::user::User;
use crate::error::AuthError;

/// The user resolved for this request, `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.is_admin)
    }
}

pub fn with_user<B>(req: &mut Request<B>, user: Option<User>) {
    req.extensions_mut().insert(CurrentUser(user));
}

/// `None` both for anonymous requests and for requests that never passed
/// through `set_user`.
pub fn user_from<B>(req: &Request<B>) -> Option<&User> {
    req.extensions()
        .get::<CurrentUser>()
        .and_then(CurrentUser::user)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for handlers that need a user; anonymous requests get 401.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .map(RequireUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_missing_context_is_anonymous() {
        let req = Request::new(Body::empty());
        assert!(user_from(&req).is_none());
    }

    #[test]
    fn test_with_user_none() {
        let mut req = Request::new(Body::empty());
        with_user(&mut req, None);
        assert!(user_from(&req).is_none());
        assert!(!req.extensions().get::<CurrentUser>().unwrap().is_admin());
    }
}
