//! Shared Kernel
//!
//! Vocabulary that every backend crate agrees on:
//! - [`error::kind::ErrorKind`] and [`error::app_error::AppError`], the single
//!   error classification rendered at the HTTP boundary
//! - [`id::Id`], typed UUID identifiers
//!
//! Nothing here knows about users, tokens or cookies.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
