//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;

use platform::client::ClientIp;

use crate::application::SignUpInput;
use crate::domain::repository::{TokenStore, UserStore};
use crate::error::{AuthError, AuthResult};
use crate::presentation::context::RequireUser;
use crate::presentation::dto::{
    LogInRequest, PasswordResetConfirmRequest, SignUpRequest, UserResponse,
};
use crate::presentation::middleware::AuthAppState;

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<U, T>(
    State(state): State<AuthAppState<U, T>>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    let input = SignUpInput {
        name: req.name,
        surname: req.surname,
        email: req.email,
        password: req.password,
        remember_me: req.remember_me,
    };

    let signed_in = state.auth.sign_up(input, ip).await?;
    let body = UserResponse::from(&signed_in.user);

    Ok((StatusCode::CREATED, jar.add(signed_in.cookie), Json(body)))
}

// ============================================================================
// Log In
// ============================================================================

/// POST /api/auth/login
pub async fn log_in<U, T>(
    State(state): State<AuthAppState<U, T>>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    Json(req): Json<LogInRequest>,
) -> AuthResult<impl IntoResponse>
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    let signed_in = state
        .auth
        .log_in(&req.email, req.password, req.remember_me, ip).await?;
    let body = UserResponse::from(&signed_in.user);

    Ok((jar.add(signed_in.cookie), Json(body)))
}

// ============================================================================
// Log Out
// ============================================================================

/// POST /api/auth/logout
///
/// Always clears the cookie. Revocation failures are only logged.
pub async fn log_out<U, T>(
    State(state): State<AuthAppState<U, T>>,
    jar: CookieJar,
) -> impl IntoResponse
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    let logged_out = state.auth.log_out(&jar).await;

    if let Some(e) = &logged_out.error {
        e.log();
    }

    (StatusCode::NO_CONTENT, jar.add(logged_out.cookie))
}

// ============================================================================
// Current User
// ============================================================================

/// GET /api/auth/me
pub async fn me(RequireUser(user): RequireUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

// ============================================================================
// Password Reset
// ============================================================================

/// GET /api/auth/password-reset/{token}
///
/// 204 when the token can still be used, 410 otherwise.
pub async fn password_reset_check<U, T>(
    State(state): State<AuthAppState<U, T>>,
    Path(token): Path<String>,
) -> AuthResult<StatusCode>
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    if state.auth.validate_password_reset_token(&token).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AuthError::InvalidToken)
    }
}

/// POST /api/auth/password-reset
///
/// Sets the new password and logs the user out everywhere.
pub async fn password_reset_confirm<U, T>(
    State(state): State<AuthAppState<U, T>>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> AuthResult<StatusCode>
where
    U: UserStore + Sync + 'static,
    T: TokenStore + Sync + 'static,
{
    state.auth.reset_password(&req.token, req.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
