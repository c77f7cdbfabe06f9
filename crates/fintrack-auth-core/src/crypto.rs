//! Cryptographic primitives shared by the envelope and token code
//!
//! Comparisons of secret-derived values go through [`constant_time_eq`] so
//! that timing does not reveal how many leading bytes matched.

use jsonwebtoken::{DecodingKey, EncodingKey};
use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// HMAC-SHA256 secret for access and refresh tokens.
///
/// Validates the length once and keeps the derived jsonwebtoken keys so
/// signing and verification do not rebuild them per call.
#[derive(Clone)]
pub struct SigningSecret {
    encoding: EncodingKey,
    decoding: DecodingKey,
    len: usize,
}

impl SigningSecret {
    /// Minimum allowed secret length in bytes (256 bits)
    pub const MIN_KEY_LENGTH: usize = 32;

    /// Create a signing secret from bytes.
    ///
    /// # Errors
    /// Returns error if the secret is shorter than 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SigningSecretError> {
        let bytes = secret.as_ref();
        if bytes.len() < Self::MIN_KEY_LENGTH {
            return Err(SigningSecretError::KeyTooShort {
                actual: bytes.len(),
                minimum: Self::MIN_KEY_LENGTH,
            });
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            len: bytes.len(),
        })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("key_length", &self.len)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when creating a signing secret
#[derive(Debug, Clone, thiserror::Error)]
pub enum SigningSecretError {
    #[error("signing secret too short: got {actual} bytes, need at least {minimum}")]
    KeyTooShort { actual: usize, minimum: usize },
}

/// Constant-time byte slice comparison.
///
/// Returns `false` immediately if lengths differ (length is not secret).
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time string comparison.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Lowercase hex MD5 digest
pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Md5::digest(data.as_ref()))
}
