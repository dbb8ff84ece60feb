//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::Authentication;
use crate::domain::repository::{TokenStore, UserStore};
use crate::presentation::handlers;
use crate::presentation::middleware::{AuthAppState, set_user};

/// JSON auth endpoints, wrapped in [`set_user`].
///
/// Meant to be nested, e.g. under `/api/auth`.
pub fn auth_router<U, T>(auth: Arc<Authentication<U, T>>) -> Router
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    let state = AuthAppState { auth };

    Router::new()
        .route("/signup", post(handlers::sign_up::<U, T>))
        .route("/login", post(handlers::log_in::<U, T>))
        .route("/logout", post(handlers::log_out::<U, T>))
        .route("/me", get(handlers::me))
        .route(
            "/password-reset",
            post(handlers::password_reset_confirm::<U, T>),
        )
        .route(
            "/password-reset/{token}",
            get(handlers::password_reset_check::<U, T>),
        )
        .layer(from_fn_with_state(state.clone(), set_user::<U, T>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::tests::harness;

    fn json(method: &str, uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn set_cookie(response: &axum::response::Response) -> String {
        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signup_then_me() {
        let h = harness();
        let app = auth_router(Arc::clone(&h.auth));

        let response = app
            .clone()
            .oneshot(json(
                "POST",
                "/signup",
                concat!(
                    r#"{"name":"Ada","surname":"Lovelace","email":"ada@example.com","#,
                    r#""password":"correct horse","rememberMe":true}"#,
                ),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = set_cookie(&response);

        let response = app
            .clone()
            .oneshot(json("GET", "/me", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(json("GET", "/me", "", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let h = harness();
        h.sign_up("ada@example.com").await;
        let app = auth_router(Arc::clone(&h.auth));

        let response = app
            .oneshot(json(
                "POST",
                "/login",
                r#"{"email":"ada@example.com","password":"wrong"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_login_remember_me_sets_persistent_cookie() {
        let h = harness();
        h.sign_up("ada@example.com").await;
        let app = auth_router(Arc::clone(&h.auth));

        let response = app
            .clone()
            .oneshot(json(
                "POST",
                "/login",
                r#"{"email":"ada@example.com","password":"correct horse","rememberMe":true}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(raw.contains("Max-Age=3600"));

        let response = app
            .oneshot(json(
                "POST",
                "/login",
                r#"{"email":"ada@example.com","password":"correct horse"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(!raw.contains("Max-Age"));
        assert!(!raw.contains("Expires"));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let h = harness();
        let (_, cookie) = h.sign_up("ada@example.com").await;
        let app = auth_router(Arc::clone(&h.auth));

        let response = app
            .clone()
            .oneshot(json("POST", "/logout", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(set_cookie(&response), format!("{}=", h.auth.cookie_name()));

        let response = app
            .oneshot(json("GET", "/me", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_reset_endpoints() {
        let h = harness();
        h.sign_up("ada@example.com").await;
        let (_, token) = h
            .auth
            .generate_password_reset_token("ada@example.com")
            .await
            .unwrap();
        let app = auth_router(Arc::clone(&h.auth));

        let response = app
            .clone()
            .oneshot(json("GET", &format!("/password-reset/{}", token), "", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let body = format!(r#"{{"token":"{}","password":"new password"}}"#, token);
        let response = app
            .clone()
            .oneshot(json("POST", "/password-reset", &body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(json("GET", &format!("/password-reset/{}", token), "", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
    }
}
