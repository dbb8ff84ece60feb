//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store contracts
//! - `application/` - The [`Authentication`] façade and its operations
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, router, authorization gates
//!
//! ## Features
//! - Sign up / log in with e-mail + password, log out
//! - Opaque server-side tokens carried in an encrypted, authenticated cookie
//! - Cookie key rotation (current + previous key pair)
//! - Password reset tokens and password change
//! - Gates for authenticated, anonymous and admin-only routes
//!
//! ## Security Model
//! - Passwords hashed with Argon2id on a bounded blocking pool
//! - Unknown e-mail and wrong password are indistinguishable at log in
//! - Changing the password revokes every session

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::{AuthConfig, Authentication, LoggedOut, SignUpInput, SignedIn};
pub use domain::{Token, TokenStore, TokenType, User, UserStore, validate_token};
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryTokenStore, MemoryUserStore, PgTokenStore, PgUserStore};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::AppError,
    kind::ErrorKind,
};

pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::context::*;
    pub use crate::presentation::middleware::*;
}
