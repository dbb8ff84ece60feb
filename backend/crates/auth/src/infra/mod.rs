//! Infrastructure Layer
//!
//! Store implementations: PostgreSQL for deployments, in-memory for tests
//! and local tooling.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryTokenStore, MemoryUserStore};
pub use postgres::{PgTokenStore, PgUserStore};
