//! Hybrid-encrypted request envelope
//!
//! Every sensitive request body is an [`Envelope`]: an AES-128-CBC
//! ciphertext (`en_data`) whose key and IV travel RSA-OAEP wrapped in
//! `enc_payload`, bound to a timestamp by an MD5 signature.
//!
//! [`EnvelopeOpener::open`] checks, in order: replay window, key recovery,
//! key material, signature, ciphertext framing, padding. Any failure aborts
//! before the plaintext is handed out.

mod cipher;
mod keys;
mod payload;
mod seal;
mod signature;

use std::sync::Arc;

use rsa::RsaPublicKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::EnvelopeConfig;
use crate::AuthError;

pub use cipher::{strip_padding, BLOCK_SIZE};
pub use keys::{KeyLoadError, KeyMaterial, PrivateKey, KEY_EXCHANGE_LEN};
pub use payload::decode_payload;
pub use seal::{seal, seal_json, seal_with};
pub use signature::{compute_signature, verify_signature};

/// Wire format of a sealed request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unix seconds at which the client sealed the request
    pub timestamp: i64,
    /// Lowercase hex signature over the key material and timestamp
    pub sign: String,
    /// Base64 AES-128-CBC ciphertext
    pub en_data: String,
    /// Base64 RSA-OAEP(SHA-1) ciphertext of the 48-byte key exchange
    pub enc_payload: String,
}

/// Opens envelopes with the server private key
pub struct EnvelopeOpener {
    key: PrivateKey,
    config: EnvelopeConfig,
    clock: Arc<dyn Clock>,
}

impl EnvelopeOpener {
    pub fn new(key: PrivateKey, config: EnvelopeConfig, clock: Arc<dyn Clock>) -> Self {
        Self { key, config, clock }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.key.public_key()
    }

    /// Validate and decrypt an envelope, returning the plaintext
    pub fn open(&self, envelope: &Envelope) -> Result<Vec<u8>, AuthError> {
        self.check_timestamp(envelope.timestamp)?;

        let material = self.key.recover(&envelope.enc_payload)?;
        verify_signature(&material, envelope.timestamp, &envelope.sign)?;

        let ciphertext = cipher::decode_ciphertext(&envelope.en_data)?;
        cipher::decrypt(material.key(), material.iv(), ciphertext)
    }

    /// Open an envelope and decode its plaintext as `T`
    pub fn open_as<T: DeserializeOwned>(&self, envelope: &Envelope) -> Result<T, AuthError> {
        let plaintext = self.open(envelope)?;
        decode_payload(&plaintext)
    }

    fn check_timestamp(&self, timestamp: i64) -> Result<(), AuthError> {
        let now = self.clock.now().timestamp();
        let skew = now.abs_diff(timestamp);
        if skew > self.config.replay_window.as_secs() {
            tracing::debug!(skew, "Envelope outside replay window");
            return Err(AuthError::StaleTimestamp);
        }
        Ok(())
    }
}

impl std::fmt::Debug for EnvelopeOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeOpener")
            .field("key", &self.key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
