//! Value Object Module

pub mod email;
pub mod person_name;

pub use kernel::id::UserId;
