//! Application Layer
//!
//! [`Authentication`] is the façade every caller goes through. Each group of
//! operations lives in its own file as an `impl` block on it.

pub mod authentication;
pub mod config;
pub mod log_in;
pub mod log_out;
pub mod password_reset;
pub mod resolve_user;
pub mod sign_up;

// Re-exports
pub use authentication::{Authentication, SignedIn};
pub use config::AuthConfig;
pub use log_out::LoggedOut;
pub use sign_up::SignUpInput;
