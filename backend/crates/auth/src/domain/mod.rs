//! Domain Layer
//!
//! Entities, value objects, and the store contracts the application layer
//! depends on.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::token::{Token, TokenType, validate_token};
pub use entity::user::User;
pub use repository::{TokenStore, UserStore};
