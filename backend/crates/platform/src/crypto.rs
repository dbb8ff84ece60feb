//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag in bytes
pub const HMAC_SHA256_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secure random source failed: {0}")]
    Entropy(#[from] rand::Error),

    #[error("invalid MAC key length")]
    InvalidKeyLength,
}

/// Fill a buffer of `len` bytes from the OS CSPRNG.
///
/// Unlike `fill_bytes`, failure of the random source is reported instead of
/// panicking.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// `len` random bytes encoded as URL-safe Base64 without padding.
pub fn random_token(len: usize) -> Result<String, CryptoError> {
    Ok(to_base64_url(&random_bytes(len)?))
}

/// Standard alphabet, no padding.
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD_NO_PAD.encode(bytes)
}

pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD_NO_PAD.decode(s)
}

/// URL-safe alphabet, no padding. Safe inside cookie values.
pub fn to_base64_url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn from_base64_url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s)
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; HMAC_SHA256_LEN], CryptoError> {
    let mac = keyed_mac(key, parts)?;
    Ok(mac.finalize().into_bytes().into())
}

/// Constant-time check of `tag` against HMAC-SHA256 over `parts`.
pub fn verify_hmac_sha256(key: &[u8], parts: &[&[u8]], tag: &[u8]) -> Result<bool, CryptoError> {
    let mac = keyed_mac(key, parts)?;
    Ok(mac.verify_slice(tag).is_ok())
}

fn keyed_mac(key: &[u8], parts: &[&[u8]]) -> Result<HmacSha256, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac)
}
