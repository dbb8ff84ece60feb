//! API Server Entry Point
//!
//! Wires configuration, the Postgres stores and the auth routes into one
//! axum server. Startup failures are `anyhow` errors.

mod config;

use auth::middleware::{AuthAppState, RedirectTo, allow_admin, set_user};
use auth::{Authentication, PgTokenStore, PgUserStore, TokenStore, auth_router};
use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 31113;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (environment, auth_config) = config::auth_config_from_env()?;
    tracing::info!(?environment, "Configuration loaded");

    // Database connection
    let database_url =
        env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let tokens = Arc::new(PgTokenStore::new(pool.clone()));

    // Startup cleanup: remove expired tokens
    // Errors here should not prevent server startup
    if let Err(e) = tokens.cleanup_expired(Utc::now()).await {
        tracing::warn!(
            error = %e,
            "Token cleanup failed, continuing anyway"
        );
    }

    let auth = Arc::new(Authentication::new(users, tokens, Arc::new(auth_config))?);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Admin-only area; everyone else is sent back to the front page
    let admin = Router::new()
        .route("/api/admin/status", get(admin_status))
        .route_layer(from_fn_with_state(RedirectTo::new("/"), allow_admin))
        .layer(from_fn_with_state(
            AuthAppState {
                auth: Arc::clone(&auth),
            },
            set_user::<PgUserStore, PgTokenStore>,
        ));

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = match env::var("PORT") {
        Ok(port) => port.parse()?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /api/admin/status
async fn admin_status(
    auth::middleware::RequireUser(user): auth::middleware::RequireUser,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "admin": user.email.as_str(),
    }))
}
