//! Password Hashing and Verification
//!
//! Argon2id hashing with the cost parameters written into the hash itself
//! (PHC string format):
//!
//! ```text
//! $argon2id$v=19$m=65536,t=8,p=8$<salt>$<hash>
//! ```
//!
//! Verification reads algorithm, version, salt and costs from the stored
//! string only, so raising the configured costs never invalidates existing
//! hashes. Hashing is CPU and memory heavy; async callers go through
//! [`BoundedHasher`], which runs it on the blocking pool behind a semaphore.

use std::fmt;
use std::sync::Arc;

use argon2::password_hash::{self, SaltString};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{CryptoError, random_bytes};

// ============================================================================
// Parameters
// ============================================================================

pub const DEFAULT_SALT_LEN: usize = 32;
pub const DEFAULT_MEMORY_COST_KIB: u32 = 64 * 1024;
pub const DEFAULT_OUTPUT_LEN: usize = 32;

/// Salt bounds in bytes. The upper bound keeps the Base64 salt within the
/// 64 characters a PHC string allows.
const MIN_SALT_LEN: usize = 8;
const MAX_SALT_LEN: usize = 48;

/// Argon2id cost parameters used for new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Random salt length in bytes
    pub salt_len: usize,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Derived key length in bytes
    pub output_len: usize,
}

impl Default for HashParams {
    /// 32-byte salt, 64 MiB, 32-byte output; passes and lanes follow the
    /// number of available CPUs.
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(u8::MAX as usize) as u32;

        Self {
            salt_len: DEFAULT_SALT_LEN,
            memory_cost: DEFAULT_MEMORY_COST_KIB,
            iterations: cpus,
            parallelism: cpus,
            output_len: DEFAULT_OUTPUT_LEN,
        }
    }
}

impl HashParams {
    fn argon2(&self) -> Result<Argon2<'static>, PasswordHashError> {
        if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&self.salt_len) {
            return Err(PasswordHashError::InvalidParams(format!(
                "salt length must be between {} and {} bytes (got {})",
                MIN_SALT_LEN, MAX_SALT_LEN, self.salt_len
            )));
        }

        let params = Params::new(
            self.memory_cost,
            self.iterations,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Invalid password hash parameters: {0}")]
    InvalidParams(String),

    #[error("Could not generate salt")]
    Entropy(#[source] CryptoError),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    /// Stored hash uses another algorithm or Argon2 version.
    #[error("Unsupported password hash: {0}")]
    Unsupported(String),

    #[error("Password hashing worker unavailable")]
    WorkerUnavailable,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Password as typed by the user.
///
/// NFKC-normalized so that visually identical input hashes identically.
/// Not `Clone`, redacted in `Debug`, wiped from memory on drop.
/// Length and strength rules are left to the caller.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    /// Empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format, safe to persist.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Wrap a stored PHC string, checking that it parses.
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Synchronous Argon2id hasher bound to one set of [`HashParams`].
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: HashParams,
}

impl PasswordHasher {
    /// Fails if Argon2 rejects `params`.
    pub fn new(params: HashParams) -> Result<Self, PasswordHashError> {
        params.argon2()?;
        Ok(Self { params })
    }

    /// Hash with a fresh random salt.
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let salt = random_bytes(self.params.salt_len).map_err(PasswordHashError::Entropy)?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        let hash = self
            .params
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }

    /// Check `password` against `hashed`.
    ///
    /// Only the parameters inside `hashed` are used. The digest comparison is
    /// constant-time. `Ok(false)` means "does not match"; an `Err` means the
    /// stored hash itself is unusable.
    pub fn verify(
        &self,
        password: &ClearTextPassword,
        hashed: &HashedPassword,
    ) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(&hashed.hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return Err(PasswordHashError::Unsupported(format!(
                "algorithm {}",
                parsed.algorithm
            )));
        }
        if parsed.version != Some(Version::V0x13 as u32) {
            return Err(PasswordHashError::Unsupported(
                "argon2 version mismatch".to_string(),
            ));
        }

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordHashError::HashingFailed(e.to_string())),
        }
    }
}

// ============================================================================
// Bounded async front-end
// ============================================================================

/// Runs hashing on Tokio's blocking pool, at most `max_concurrent` at a time.
///
/// Each Argon2 call holds `memory_cost` KiB; the bound caps total memory and
/// keeps request threads free.
#[derive(Debug, Clone)]
pub struct BoundedHasher {
    hasher: Arc<PasswordHasher>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BoundedHasher {
    pub fn new(hasher: PasswordHasher, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            hasher: Arc::new(hasher),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn hash(
        &self,
        password: ClearTextPassword,
    ) -> Result<HashedPassword, PasswordHashError> {
        self.run(move |hasher| hasher.hash(&password)).await
    }

    pub async fn verify(
        &self,
        password: ClearTextPassword,
        hashed: HashedPassword,
    ) -> Result<bool, PasswordHashError> {
        self.run(move |hasher| hasher.verify(&password, &hashed)).await
    }

    async fn run<R, F>(&self, job: F) -> Result<R, PasswordHashError>
    where
        F: FnOnce(&PasswordHasher) -> Result<R, PasswordHashError> + Send + 'static,
        R: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PasswordHashError::WorkerUnavailable)?;

        // Held by the blocking job, not by the (cancellable) caller.
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || {
            let result = job(&hasher);
            drop(permit);
            result
        })
        .await
        .map_err(|_| PasswordHashError::WorkerUnavailable)?
    }
}

// ============================================================================
// Tests
// ============================================================================
