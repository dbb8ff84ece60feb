//! Application Configuration
//!
//! Immutable settings injected into [`Authentication`](super::Authentication)
//! at construction. Nothing here is read from globals.

use std::time::Duration;

use platform::password::HashParams;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Name of the authentication cookie
    pub cookie_name: String,
    /// `Domain` attribute; `None` leaves it host-only
    pub cookie_domain: Option<String>,
    /// `Secure` attribute. Disable only for plain-HTTP development.
    pub cookie_secure: bool,
    /// Lax by default: login links are followed from e-mails and other sites
    pub cookie_same_site: SameSite,
    /// Lifetime of an authentication token and its cookie
    pub token_lifetime: Duration,
    /// Lifetime of a password reset token
    pub reset_token_lifetime: Duration,
    /// `base64(hash_key)$base64(block_key)` used for new cookies
    pub current_cookie_key: String,
    /// Key pair from before the last rotation; empty when there is none
    pub previous_cookie_key: String,
    /// Argon2id costs for new password hashes
    pub hash_params: HashParams,
    /// Upper bound on simultaneous Argon2 computations
    pub max_concurrent_hashes: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth_token".to_string(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            token_lifetime: Duration::from_secs(7 * 24 * 3600), // 1 week
            reset_token_lifetime: Duration::from_secs(3600),    // 1 hour
            current_cookie_key: String::new(),
            previous_cookie_key: String::new(),
            hash_params: HashParams::default(),
            max_concurrent_hashes: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}
