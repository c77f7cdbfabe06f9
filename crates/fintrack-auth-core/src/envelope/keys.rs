//! Server private key and per-request key recovery

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;

use crate::AuthError;

/// Length of the decrypted `enc_payload`: two 24-byte base64 strings
pub const KEY_EXCHANGE_LEN: usize = 48;

/// Length of the base64 text of a 16-byte value
pub const ENCODED_HALF_LEN: usize = KEY_EXCHANGE_LEN / 2;

/// AES-128 key and CBC IV length
pub const RAW_KEY_LEN: usize = 16;

/// The server's RSA private key, loaded once and shared read-only
#[derive(Clone)]
pub struct PrivateKey {
    inner: Arc<RsaPrivateKey>,
}

impl PrivateKey {
    /// Wrap an already parsed key
    pub fn from_rsa(key: RsaPrivateKey) -> Self {
        Self {
            inner: Arc::new(key),
        }
    }

    /// Parse a PEM document, PKCS#8 first and PKCS#1 as fallback
    pub fn from_pem(pem: &str) -> Result<Self, KeyLoadError> {
        match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => Ok(Self::from_rsa(key)),
            Err(pkcs8_err) => {
                tracing::debug!("PKCS#8 parse failed ({}), trying PKCS#1", pkcs8_err);
                RsaPrivateKey::from_pkcs1_pem(pem)
                    .map(Self::from_rsa)
                    .map_err(|e| KeyLoadError::Parse(e.to_string()))
            }
        }
    }

    /// Read and parse a PEM file
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, KeyLoadError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|source| KeyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let key = Self::from_pem(&pem)?;
        tracing::info!(path = %path.display(), "Loaded envelope private key");
        Ok(key)
    }

    /// Public half, handed to clients for wrapping their per-request keys
    pub fn public_key(&self) -> RsaPublicKey {
        self.inner.to_public_key()
    }

    /// Base64-decode and RSA-OAEP(SHA-1) decrypt `enc_payload`, then decode
    /// the two base64 halves into an AES key and IV.
    pub(crate) fn recover(&self, enc_payload: &str) -> Result<KeyMaterial, AuthError> {
        let wrapped = STANDARD
            .decode(enc_payload)
            .map_err(|_| AuthError::KeyRecoveryFailed)?;

        let exchange = self
            .inner
            .decrypt(Oaep::new::<Sha1>(), &wrapped)
            .map_err(|_| AuthError::KeyRecoveryFailed)?;

        let exchange: [u8; KEY_EXCHANGE_LEN] = exchange
            .as_slice()
            .try_into()
            .map_err(|_| AuthError::KeyRecoveryFailed)?;

        KeyMaterial::from_exchange(exchange)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use rsa::traits::PublicKeyParts;
        f.debug_struct("PrivateKey")
            .field("bits", &(self.inner.size() * 8))
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when loading the private key
#[derive(Debug, thiserror::Error)]
pub enum KeyLoadError {
    #[error("failed to read private key {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RSA private key: {0}")]
    Parse(String),
}

/// Symmetric key material recovered from one envelope.
///
/// Keeps the base64 text exactly as it was decrypted, since the envelope
/// signature is computed over those bytes.
pub struct KeyMaterial {
    key_b64: [u8; ENCODED_HALF_LEN],
    iv_b64: [u8; ENCODED_HALF_LEN],
    key: [u8; RAW_KEY_LEN],
    iv: [u8; RAW_KEY_LEN],
}

impl KeyMaterial {
    pub(crate) fn from_exchange(exchange: [u8; KEY_EXCHANGE_LEN]) -> Result<Self, AuthError> {
        let mut key_b64 = [0u8; ENCODED_HALF_LEN];
        let mut iv_b64 = [0u8; ENCODED_HALF_LEN];
        key_b64.copy_from_slice(&exchange[..ENCODED_HALF_LEN]);
        iv_b64.copy_from_slice(&exchange[ENCODED_HALF_LEN..]);

        Ok(Self {
            key: decode_half(&key_b64)?,
            iv: decode_half(&iv_b64)?,
            key_b64,
            iv_b64,
        })
    }

    pub fn key_b64(&self) -> &[u8] {
        &self.key_b64
    }

    pub fn iv_b64(&self) -> &[u8] {
        &self.iv_b64
    }

    pub fn key(&self) -> &[u8; RAW_KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; RAW_KEY_LEN] {
        &self.iv
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

fn decode_half(encoded: &[u8]) -> Result<[u8; RAW_KEY_LEN], AuthError> {
    let raw = STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::InvalidKeyMaterial)?;
    raw.as_slice()
        .try_into()
        .map_err(|_| AuthError::InvalidKeyMaterial)
}
