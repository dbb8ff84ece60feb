//! Platform Crate - Technical Infrastructure
//!
//! Building blocks with no knowledge of users or business rules:
//! - Password hashing (Argon2id, PHC strings, bounded blocking pool)
//! - Signed and encrypted cookie values with key rotation
//! - Cookie attribute policy
//! - Randomness, HMAC and Base64 helpers
//! - Injectable clock
//! - Client address extraction

pub mod client;
pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod secure_cookie;
