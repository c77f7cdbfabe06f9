//! AES-128-CBC body decryption

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::AuthError;

use super::keys::RAW_KEY_LEN;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Base64-decode `en_data` and check it is a whole number of blocks
pub(crate) fn decode_ciphertext(en_data: &str) -> Result<Vec<u8>, AuthError> {
    let ciphertext = STANDARD
        .decode(en_data)
        .map_err(|_| AuthError::MalformedCiphertext)?;
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(AuthError::MalformedCiphertext);
    }
    Ok(ciphertext)
}

/// Decrypt in place and strip the trailing pad
pub(crate) fn decrypt(
    key: &[u8; RAW_KEY_LEN],
    iv: &[u8; RAW_KEY_LEN],
    mut buf: Vec<u8>,
) -> Result<Vec<u8>, AuthError> {
    let len = Aes128CbcDec::new(&(*key).into(), &(*iv).into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| AuthError::MalformedCiphertext)?
        .len();
    buf.truncate(len);

    let unpadded = strip_padding(&buf)?.len();
    buf.truncate(unpadded);
    Ok(buf)
}

/// Remove PKCS#7-style padding by trusting the last byte as the pad length.
///
/// Only the pad length is validated (1..=16 and not longer than the
/// buffer); the pad bytes themselves are not inspected.
pub fn strip_padding(plaintext: &[u8]) -> Result<&[u8], AuthError> {
    let pad = match plaintext.last() {
        Some(&p) => usize::from(p),
        None => return Err(AuthError::InvalidPadding),
    };
    if pad == 0 || pad > BLOCK_SIZE || pad > plaintext.len() {
        return Err(AuthError::InvalidPadding);
    }
    Ok(&plaintext[..plaintext.len() - pad])
}
