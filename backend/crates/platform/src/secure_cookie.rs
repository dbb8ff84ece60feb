//! Authenticated, encrypted cookie values with two-slot key rotation
//!
//! A value is serialized to JSON, encrypted with AES-256-GCM under the
//! block key (cookie name bound as associated data), timestamped, and
//! authenticated with HMAC-SHA256 under the hash key:
//!
//! ```text
//! base64url( <unix_ts> "|" base64url(nonce || ciphertext) "|" base64url(hmac) )
//! hmac = HMAC-SHA256(hash_key, <name> "|" <unix_ts> "|" base64url(nonce || ciphertext))
//! ```
//!
//! Encoding always uses the current key pair. Decoding tries the current
//! pair, then the previous one, so cookies issued before a rotation keep
//! working until the previous pair is retired.
//!
//! Operators handle key pairs as `base64(hash_key)$base64(block_key)`
//! (standard alphabet, no padding).

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{
    self, CryptoError, HMAC_SHA256_LEN, from_base64_url, hmac_sha256, to_base64_url,
    verify_hmac_sha256,
};

/// HMAC key length in bytes
pub const HASH_KEY_LEN: usize = 64;
/// AES-256 key length in bytes
pub const BLOCK_KEY_LEN: usize = 32;
/// Browsers drop cookies larger than this
pub const MAX_COOKIE_LEN: usize = 4096;
/// Age after which an encoded value is rejected regardless of cookie expiry
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

const KEY_SEPARATOR: char = '$';
const FIELD_SEPARATOR: char = '|';
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SecureCookieError {
    #[error("Invalid secure cookie key: {0}")]
    InvalidKey(String),

    #[error("Could not generate key material")]
    Entropy(#[source] CryptoError),

    #[error("Cookie value serialization failed")]
    Serialization(#[from] serde_json::Error),

    #[error("Cookie value encryption failed")]
    Encryption,

    #[error("Encoded cookie is {len} bytes, limit is {MAX_COOKIE_LEN}")]
    TooLong { len: usize },

    #[error("Malformed cookie value")]
    Malformed,

    #[error("Cookie signature mismatch")]
    InvalidMac,

    #[error("Cookie value expired")]
    Expired,

    #[error("Cookie value decryption failed")]
    Decryption,
}

// ============================================================================
// Key material
// ============================================================================

/// One hash key and one block key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CookieKeyPair {
    hash_key: [u8; HASH_KEY_LEN],
    block_key: [u8; BLOCK_KEY_LEN],
}

impl CookieKeyPair {
    pub fn new(hash_key: [u8; HASH_KEY_LEN], block_key: [u8; BLOCK_KEY_LEN]) -> Self {
        Self {
            hash_key,
            block_key,
        }
    }

    /// Fresh pair from the OS CSPRNG.
    pub fn generate() -> Result<Self, SecureCookieError> {
        let hash = crypto::random_bytes(HASH_KEY_LEN).map_err(SecureCookieError::Entropy)?;
        let block = crypto::random_bytes(BLOCK_KEY_LEN).map_err(SecureCookieError::Entropy)?;
        Self::from_slices(&hash, &block)
    }

    /// Parse `base64(hash_key)$base64(block_key)`.
    pub fn from_key_string(key: &str) -> Result<Self, SecureCookieError> {
        let (hash, block) = key.trim().split_once(KEY_SEPARATOR).ok_or_else(|| {
            SecureCookieError::InvalidKey(format!("missing '{}' separator", KEY_SEPARATOR))
        })?;

        let hash = crypto::from_base64(hash)
            .map_err(|e| SecureCookieError::InvalidKey(format!("hash key: {}", e)))?;
        let block = crypto::from_base64(block)
            .map_err(|e| SecureCookieError::InvalidKey(format!("block key: {}", e)))?;

        Self::from_slices(&hash, &block)
    }

    /// Like [`from_key_string`](Self::from_key_string), but an empty string
    /// means "no key configured".
    pub fn from_optional_key_string(key: &str) -> Result<Option<Self>, SecureCookieError> {
        if key.trim().is_empty() {
            return Ok(None);
        }
        Self::from_key_string(key).map(Some)
    }

    /// Inverse of [`from_key_string`](Self::from_key_string).
    pub fn to_key_string(&self) -> String {
        format!(
            "{}{}{}",
            crypto::to_base64(&self.hash_key),
            KEY_SEPARATOR,
            crypto::to_base64(&self.block_key)
        )
    }

    fn from_slices(hash: &[u8], block: &[u8]) -> Result<Self, SecureCookieError> {
        let hash_key: [u8; HASH_KEY_LEN] = hash.try_into().map_err(|_| {
            SecureCookieError::InvalidKey(format!(
                "hash key must be {} bytes (got {})",
                HASH_KEY_LEN,
                hash.len()
            ))
        })?;
        let block_key: [u8; BLOCK_KEY_LEN] = block.try_into().map_err(|_| {
            SecureCookieError::InvalidKey(format!(
                "block key must be {} bytes (got {})",
                BLOCK_KEY_LEN,
                block.len()
            ))
        })?;
        Ok(Self::new(hash_key, block_key))
    }

    fn seal(
        &self,
        name: &str,
        plaintext: &[u8],
        now: DateTime<Utc>,
    ) -> Result<String, SecureCookieError> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.block_key).map_err(|_| SecureCookieError::Encryption)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| SecureCookieError::Encryption)?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);

        let body = format!("{}{}{}", now.timestamp(), FIELD_SEPARATOR, to_base64_url(&sealed));
        let tag = hmac_sha256(&self.hash_key, &[name.as_bytes(), b"|", body.as_bytes()])
            .map_err(|_| SecureCookieError::Encryption)?;

        Ok(to_base64_url(
            format!("{}{}{}", body, FIELD_SEPARATOR, to_base64_url(&tag)).as_bytes(),
        ))
    }

    fn open(
        &self,
        name: &str,
        encoded: &str,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<Vec<u8>, SecureCookieError> {
        let outer = from_base64_url(encoded).map_err(|_| SecureCookieError::Malformed)?;
        let outer = std::str::from_utf8(&outer).map_err(|_| SecureCookieError::Malformed)?;

        let (body, tag) = outer
            .rsplit_once(FIELD_SEPARATOR)
            .ok_or(SecureCookieError::Malformed)?;
        let tag = from_base64_url(tag).map_err(|_| SecureCookieError::Malformed)?;
        if tag.len() != HMAC_SHA256_LEN {
            return Err(SecureCookieError::Malformed);
        }

        let signed = [name.as_bytes(), b"|", body.as_bytes()];
        let authentic = verify_hmac_sha256(&self.hash_key, &signed, &tag)
            .map_err(|_| SecureCookieError::InvalidMac)?;
        if !authentic {
            return Err(SecureCookieError::InvalidMac);
        }

        let (timestamp, sealed) = body
            .split_once(FIELD_SEPARATOR)
            .ok_or(SecureCookieError::Malformed)?;
        let issued_at = timestamp
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .ok_or(SecureCookieError::Malformed)?;
        if max_age > Duration::zero() && issued_at < now - max_age {
            return Err(SecureCookieError::Expired);
        }

        let sealed = from_base64_url(sealed).map_err(|_| SecureCookieError::Malformed)?;
        if sealed.len() <= NONCE_LEN {
            return Err(SecureCookieError::Malformed);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher =
            Aes256Gcm::new_from_slice(&self.block_key).map_err(|_| SecureCookieError::Decryption)?;
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| SecureCookieError::Decryption)
    }
}

impl fmt::Debug for CookieKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieKeyPair")
            .field("hash_key", &"[REDACTED]")
            .field("block_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Encoder/decoder for one cookie name.
#[derive(Debug, Clone)]
pub struct SecureCookieCodec {
    name: String,
    current: CookieKeyPair,
    previous: Option<CookieKeyPair>,
    max_age: Duration,
}

impl SecureCookieCodec {
    pub fn new(
        name: impl Into<String>,
        current: CookieKeyPair,
        previous: Option<CookieKeyPair>,
    ) -> Self {
        Self {
            name: name.into(),
            current,
            previous,
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
        }
    }

    /// Override the maximum accepted age. Zero or negative disables the check.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SecureCookieError> {
        self.encode_at(value, Utc::now())
    }

    /// Encode under the current key pair, stamped with `now`.
    pub fn encode_at<T: Serialize + ?Sized>(
        &self,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<String, SecureCookieError> {
        let mut plaintext = serde_json::to_vec(value)?;
        let sealed = self.current.seal(&self.name, &plaintext, now);
        plaintext.zeroize();
        let encoded = sealed?;

        // name=value must fit in a single cookie
        let len = self.name.len() + 1 + encoded.len();
        if len > MAX_COOKIE_LEN {
            return Err(SecureCookieError::TooLong { len });
        }
        Ok(encoded)
    }

    pub fn decode<T: DeserializeOwned>(&self, encoded: &str) -> Result<T, SecureCookieError> {
        self.decode_at(encoded, Utc::now())
    }

    /// Decode with the current key pair, falling back to the previous one.
    ///
    /// When both fail, the error from the current pair is returned, unless
    /// the previous pair authenticated an expired value; that is reported as
    /// [`SecureCookieError::Expired`].
    pub fn decode_at<T: DeserializeOwned>(
        &self,
        encoded: &str,
        now: DateTime<Utc>,
    ) -> Result<T, SecureCookieError> {
        if encoded.len() > MAX_COOKIE_LEN {
            return Err(SecureCookieError::TooLong { len: encoded.len() });
        }

        let plaintext = match self.current.open(&self.name, encoded, now, self.max_age) {
            Ok(plaintext) => plaintext,
            Err(current_err) => match &self.previous {
                Some(previous) => {
                    let plaintext = previous
                        .open(&self.name, encoded, now, self.max_age)
                        .map_err(|e| match e {
                            SecureCookieError::Expired => e,
                            _ => current_err,
                        })?;
                    tracing::debug!(cookie = %self.name, "Cookie decoded with previous key");
                    plaintext
                }
                None => return Err(current_err),
            },
        };

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn pair(seed: u8) -> CookieKeyPair {
        CookieKeyPair::new([seed; HASH_KEY_LEN], [seed.wrapping_add(1); BLOCK_KEY_LEN])
    }

    #[test]
    fn test_round_trip() {
        let codec = SecureCookieCodec::new("auth", pair(1), None);
        let encoded = codec.encode_at("token-value", now()).unwrap();
        let decoded: String = codec.decode_at(&encoded, now()).unwrap();
        assert_eq!(decoded, "token-value");
    }

    #[test]
    fn test_encoded_value_hides_plaintext() {
        let codec = SecureCookieCodec::new("auth", pair(1), None);
        let encoded = codec.encode_at("very-recognizable", now()).unwrap();
        let outer = String::from_utf8(from_base64_url(&encoded).unwrap()).unwrap();
        assert!(!outer.contains("very-recognizable"));
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_previous_key_still_decodes_after_rotation() {
        let old = SecureCookieCodec::new("auth", pair(1), None);
        let encoded = old.encode_at("issued-before-rotation", now()).unwrap();

        let rotated = SecureCookieCodec::new("auth", pair(9), Some(pair(1)));
        let decoded: String = rotated.decode_at(&encoded, now()).unwrap();
        assert_eq!(decoded, "issued-before-rotation");

        // New cookies are issued under the new current pair only
        let fresh = rotated.encode_at("fresh", now()).unwrap();
        assert!(old.decode_at::<String>(&fresh, now()).is_err());
    }

    #[test]
    fn test_foreign_key_rejected() {
        let foreign = SecureCookieCodec::new("auth", pair(42), None);
        let encoded = foreign.encode_at("forged", now()).unwrap();

        let codec = SecureCookieCodec::new("auth", pair(1), Some(pair(2)));
        assert!(matches!(
            codec.decode_at::<String>(&encoded, now()),
            Err(SecureCookieError::InvalidMac)
        ));
    }

    #[test]
    fn test_name_is_bound_into_mac() {
        let session = SecureCookieCodec::new("session", pair(1), None);
        let other = SecureCookieCodec::new("other", pair(1), None);
        let encoded = session.encode_at("value", now()).unwrap();
        assert!(matches!(
            other.decode_at::<String>(&encoded, now()),
            Err(SecureCookieError::InvalidMac)
        ));
    }

    #[test]
    fn test_tampered_value_rejected() {
        let codec = SecureCookieCodec::new("auth", pair(1), None);
        let encoded = codec.encode_at("value", now()).unwrap();

        let mut outer = from_base64_url(&encoded).unwrap();
        outer[0] = if outer[0] == b'1' { b'2' } else { b'1' };
        let tampered = to_base64_url(&outer);

        assert!(matches!(
            codec.decode_at::<String>(&tampered, now()),
            Err(SecureCookieError::InvalidMac)
        ));
        assert!(matches!(
            codec.decode_at::<String>("%%%garbage%%%", now()),
            Err(SecureCookieError::Malformed)
        ));
        assert!(codec.decode_at::<String>("", now()).is_err());
    }

    #[test]
    fn test_max_age_enforced() {
        let codec = SecureCookieCodec::new("auth", pair(1), None).with_max_age(Duration::hours(1));
        let encoded = codec.encode_at("value", now()).unwrap();

        let just_inside = now() + Duration::hours(1);
        assert!(codec.decode_at::<String>(&encoded, just_inside).is_ok());

        let too_late = now() + Duration::hours(1) + Duration::seconds(1);
        assert!(matches!(
            codec.decode_at::<String>(&encoded, too_late),
            Err(SecureCookieError::Expired)
        ));
    }

    #[test]
    fn test_oversized_value_rejected() {
        let codec = SecureCookieCodec::new("auth", pair(1), None);
        let huge = "x".repeat(MAX_COOKIE_LEN);
        assert!(matches!(
            codec.encode_at(&huge, now()),
            Err(SecureCookieError::TooLong { .. })
        ));
    }

    #[test]
    fn test_key_string_round_trip() {
        let generated = CookieKeyPair::generate().unwrap();
        let key = generated.to_key_string();

        let (hash, block) = key.split_once('$').unwrap();
        assert_eq!(hash.len(), 86); // 64 bytes, no padding
        assert_eq!(block.len(), 43); // 32 bytes, no padding

        let parsed = CookieKeyPair::from_key_string(&key).unwrap();
        assert_eq!(parsed.to_key_string(), key);
    }

    #[test]
    fn test_key_string_errors() {
        assert!(matches!(
            CookieKeyPair::from_key_string("no-separator"),
            Err(SecureCookieError::InvalidKey(_))
        ));
        assert!(matches!(
            CookieKeyPair::from_key_string("!!$!!"),
            Err(SecureCookieError::InvalidKey(_))
        ));

        let short = format!("{}${}", crypto::to_base64(&[1; 32]), crypto::to_base64(&[2; 32]));
        assert!(matches!(
            CookieKeyPair::from_key_string(&short),
            Err(SecureCookieError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_optional_key_means_none() {
        assert!(CookieKeyPair::from_optional_key_string("").unwrap().is_none());
        assert!(CookieKeyPair::from_optional_key_string("  ").unwrap().is_none());

        let key = pair(3).to_key_string();
        assert!(CookieKeyPair::from_optional_key_string(&key).unwrap().is_some());
        assert!(CookieKeyPair::from_optional_key_string("bad").is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", pair(1));
        assert!(debug.contains("REDACTED"));
    }
}
