//! Client-side envelope construction
//!
//! The server never seals; this is what clients (and tests) do to produce a
//! request the [`EnvelopeOpener`](super::EnvelopeOpener) accepts.

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use rsa::{Oaep, RsaPublicKey};
use serde::Serialize;
use sha1::Sha1;

use crate::AuthError;

use super::keys::RAW_KEY_LEN;
use super::signature::compute_signature;
use super::Envelope;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Seal `plaintext` under a fresh random key and IV
pub fn seal(
    public_key: &RsaPublicKey,
    plaintext: &[u8],
    timestamp: i64,
) -> Result<Envelope, AuthError> {
    let mut rng = rand::thread_rng();
    let mut key = [0u8; RAW_KEY_LEN];
    let mut iv = [0u8; RAW_KEY_LEN];
    rng.fill_bytes(&mut key);
    rng.fill_bytes(&mut iv);
    seal_with(public_key, &key, &iv, plaintext, timestamp)
}

/// Serialize `payload` as JSON and seal it
pub fn seal_json<T: Serialize>(
    public_key: &RsaPublicKey,
    payload: &T,
    timestamp: i64,
) -> Result<Envelope, AuthError> {
    let plaintext =
        serde_json::to_vec(payload).map_err(|e| AuthError::Internal(e.to_string()))?;
    seal(public_key, &plaintext, timestamp)
}

/// Seal `plaintext` under a caller-chosen key and IV
pub fn seal_with(
    public_key: &RsaPublicKey,
    key: &[u8; RAW_KEY_LEN],
    iv: &[u8; RAW_KEY_LEN],
    plaintext: &[u8],
    timestamp: i64,
) -> Result<Envelope, AuthError> {
    let key_b64 = STANDARD.encode(key);
    let iv_b64 = STANDARD.encode(iv);

    let exchange = format!("{key_b64}{iv_b64}");
    let wrapped = public_key
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha1>(), exchange.as_bytes())
        .map_err(|e| AuthError::Internal(format!("failed to wrap key material: {e}")))?;

    let ciphertext = Aes128CbcEnc::new(&(*key).into(), &(*iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(Envelope {
        timestamp,
        sign: compute_signature(key_b64.as_bytes(), iv_b64.as_bytes(), timestamp),
        en_data: STANDARD.encode(ciphertext),
        enc_payload: STANDARD.encode(wrapped),
    })
}
