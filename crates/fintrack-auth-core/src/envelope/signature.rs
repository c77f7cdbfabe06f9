//! Envelope signature binding key material to the timestamp

use crate::crypto::{constant_time_str_eq, md5_hex};
use crate::AuthError;

use super::keys::KeyMaterial;

/// `hex(md5(hex(md5(key_b64 ++ iv_b64)) ++ decimal(timestamp)))`
pub fn compute_signature(key_b64: &[u8], iv_b64: &[u8], timestamp: i64) -> String {
    let mut material = Vec::with_capacity(key_b64.len() + iv_b64.len());
    material.extend_from_slice(key_b64);
    material.extend_from_slice(iv_b64);

    let inner = md5_hex(&material);
    md5_hex(format!("{inner}{timestamp}"))
}

/// Check `sign` against the key material recovered from the same envelope.
///
/// Case-sensitive; uppercase hex is a mismatch.
pub fn verify_signature(
    material: &KeyMaterial,
    timestamp: i64,
    sign: &str,
) -> Result<(), AuthError> {
    let expected = compute_signature(material.key_b64(), material.iv_b64(), timestamp);
    if constant_time_str_eq(&expected, sign) {
        Ok(())
    } else {
        tracing::debug!("Envelope signature mismatch");
        Err(AuthError::SignatureMismatch)
    }
}
