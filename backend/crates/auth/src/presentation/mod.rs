//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, request context and authorization gates.

pub mod context;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use context::{CurrentUser, RequireUser, user_from, with_user};
pub use middleware::{
    AuthAppState, RedirectTo, allow_admin, allow_authenticated, allow_unauthenticated, set_user,
};
pub use router::auth_router;
