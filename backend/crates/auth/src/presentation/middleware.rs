//! Authorization Gates
//!
//! axum middleware, used with `from_fn_with_state`:
//! - [`set_user`] resolves the auth cookie into a [`CurrentUser`] and never blocks
//! - [`allow_authenticated`], [`allow_unauthenticated`] and [`allow_admin`]
//!   redirect requests that do not qualify
//!
//! Gates only read the request context, so `set_user` must run before them
//! (add it as the outer layer).

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::application::Authentication;
use crate::domain::repository::{TokenStore, UserStore};
use crate::presentation::context::{user_from, with_user};

/// Tells htmx to perform a full client-side redirect
pub const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

/// Shared state for auth handlers and `set_user`
pub struct AuthAppState<U, T> {
    pub auth: Arc<Authentication<U, T>>,
}

impl<U, T> Clone for AuthAppState<U, T> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
        }
    }
}

/// Attach the current user (or `None`) to the request.
///
/// Resolution errors such as a tampered cookie are logged and the request
/// continues anonymously.
pub async fn set_user<U, T>(
    State(state): State<AuthAppState<U, T>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    let user = match state.auth.resolve_user(&jar).await {
        Ok(user) => user,
        Err(e) => {
            e.log();
            None
        }
    };

    with_user(&mut req, user);
    next.run(req).await
}

/// Redirect target of a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTo(Arc<str>);

impl RedirectTo {
    pub fn new(to: impl Into<Arc<str>>) -> Self {
        Self(to.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `307` with `Location` and `HX-Redirect` set to the target.
    pub fn response(&self) -> Response {
        (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, self.as_str()), (HX_REDIRECT, self.as_str())],
        )
            .into_response()
    }
}

/// Only requests with a user pass.
pub async fn allow_authenticated(
    State(to): State<RedirectTo>,
    req: Request,
    next: Next,
) -> Response {
    if user_from(&req).is_none() {
        return to.response();
    }
    next.run(req).await
}

/// Only anonymous requests pass (login and sign-up pages).
pub async fn allow_unauthenticated(
    State(to): State<RedirectTo>,
    req: Request,
    next: Next,
) -> Response {
    if user_from(&req).is_some() {
        return to.response();
    }
    next.run(req).await
}

/// Only admins pass. Anonymous and non-admin requests get the same redirect.
pub async fn allow_admin(State(to): State<RedirectTo>, req: Request, next: Next) -> Response {
    if !user_from(&req).is_some_and(|u| u.is_admin) {
        return to.response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use tower::ServiceExt;

    use crate::infra::memory::{MemoryTokenStore, MemoryUserStore};
    use crate::tests::{Harness, harness};

    fn gated(h: &Harness, gate: &str) -> Router {
        let to = RedirectTo::new("/login");
        let route = Router::new().route("/", get(|| async { "ok" }));
        let route = match gate {
            "authenticated" => route.route_layer(from_fn_with_state(to, allow_authenticated)),
            "unauthenticated" => route.route_layer(from_fn_with_state(to, allow_unauthenticated)),
            _ => route.route_layer(from_fn_with_state(to, allow_admin)),
        };
        let state = AuthAppState {
            auth: Arc::clone(&h.auth),
        };
        route.layer(from_fn_with_state(
            state,
            set_user::<MemoryUserStore, MemoryTokenStore>,
        ))
    }

    fn request(cookie: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn assert_redirected(response: &Response) {
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert_eq!(response.headers()[HX_REDIRECT], "/login");
    }

    #[tokio::test]
    async fn test_allow_admin_anonymous() {
        let h = harness();
        let response = gated(&h, "admin").oneshot(request(None)).await.unwrap();
        assert_redirected(&response);
    }

    #[tokio::test]
    async fn test_allow_admin_non_admin() {
        let h = harness();
        let (_, cookie) = h.sign_up("ada@example.com").await;
        let response = gated(&h, "admin")
            .oneshot(request(Some(&cookie)))
            .await
            .unwrap();
        assert_redirected(&response);
    }

    #[tokio::test]
    async fn test_allow_admin_admin() {
        let h = harness();
        let (user, cookie) = h.sign_up("root@example.com").await;
        assert!(h.users.set_admin(&user.user_id, true).await);

        let response = gated(&h, "admin")
            .oneshot(request(Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allow_authenticated() {
        let h = harness();
        let response = gated(&h, "authenticated").oneshot(request(None)).await.unwrap();
        assert_redirected(&response);

        let (_, cookie) = h.sign_up("ada@example.com").await;
        let response = gated(&h, "authenticated")
            .oneshot(request(Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allow_unauthenticated() {
        let h = harness();
        let response = gated(&h, "unauthenticated").oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, cookie) = h.sign_up("ada@example.com").await;
        let response = gated(&h, "unauthenticated")
            .oneshot(request(Some(&cookie)))
            .await
            .unwrap();
        assert_redirected(&response);
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_anonymous() {
        let h = harness();
        let garbage = format!("{}=not-a-real-cookie", h.auth.cookie_name());
        let response = gated(&h, "unauthenticated")
            .oneshot(request(Some(&garbage)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
