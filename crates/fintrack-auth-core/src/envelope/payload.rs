//! Typed payload decoding

use serde::de::DeserializeOwned;

use crate::AuthError;

/// Deserialize a decrypted plaintext into the caller's request shape.
///
/// Unknown fields are ignored unless `T` opts into `deny_unknown_fields`.
pub fn decode_payload<T: DeserializeOwned>(plaintext: &[u8]) -> Result<T, AuthError> {
    serde_json::from_slice(plaintext).map_err(|e| {
        tracing::debug!("Envelope payload decode failed: {}", e);
        AuthError::PayloadDecodeError(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        email: String,
        password: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Optional {
        #[serde(default)]
        note: String,
    }

    #[test]
    fn test_decode_payload_ignores_extra_fields() {
        let login: Login =
            decode_payload(br#"{"email":"a@b.c","password":"pw","device":"ios"}"#).unwrap();
        assert_eq!(login.email, "a@b.c");
        assert_eq!(login.password, "pw");
    }

    #[test]
    fn test_decode_payload_defaulted_fields_left_to_caller() {
        let value: Optional = decode_payload(b"{}").unwrap();
        assert_eq!(value, Optional { note: String::new() });
    }

    #[test]
    fn test_decode_payload_rejects_invalid_json() {
        let result = decode_payload::<Login>(b"{not json");
        assert!(matches!(result, Err(AuthError::PayloadDecodeError(_))));

        let result = decode_payload::<Login>(br#"{"email":1}"#);
        assert!(matches!(result, Err(AuthError::PayloadDecodeError(_))));
    }
}
