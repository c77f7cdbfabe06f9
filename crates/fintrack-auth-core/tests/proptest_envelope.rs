//! Property-based tests for envelope opening
//!
//! These tests verify:
//! - Sealed envelopes open back to exactly the sealed plaintext
//! - Any single-character change to `sign` is detected
//! - The replay window boundary is inclusive in both directions
//! - Malformed input never panics

mod common;

use base64::{engine::general_purpose::STANDARD, Engine};
use fintrack_auth_core::envelope::{seal, seal_with, strip_padding};
use fintrack_auth_core::{AuthError, Envelope};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_plaintext() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..300)
}

/// Envelopes whose fields are arbitrary text
fn arb_garbage_envelope() -> impl Strategy<Value = Envelope> {
    (
        (common::NOW - 60)..=(common::NOW + 60),
        "[0-9a-f]{0,40}",
        "[A-Za-z0-9+/=!@]{0,64}",
        "[A-Za-z0-9+/=!@]{0,200}",
    )
        .prop_map(|(timestamp, sign, en_data, enc_payload)| Envelope {
            timestamp,
            sign,
            en_data,
            enc_payload,
        })
}

// ============================================================================
// Round trip
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: open(seal(p)) == p for any key, IV and plaintext
    #[test]
    fn prop_seal_open_roundtrip(
        key in any::<[u8; 16]>(),
        iv in any::<[u8; 16]>(),
        plaintext in arb_plaintext(),
        skew in -60i64..=60,
    ) {
        let opener = common::opener_at(common::NOW);
        let envelope = seal_with(&opener.public_key(), &key, &iv, &plaintext, common::NOW + skew).unwrap();
        prop_assert_eq!(opener.open(&envelope).unwrap(), plaintext);
    }

    /// Property: changing any one character of `sign` is a signature mismatch
    #[test]
    fn prop_sign_tamper_detected(
        plaintext in arb_plaintext(),
        position in 0usize..32,
        replacement in "[0-9a-f]",
    ) {
        let opener = common::opener_at(common::NOW);
        let mut envelope = seal(&opener.public_key(), &plaintext, common::NOW).unwrap();

        let original = &envelope.sign[position..position + 1];
        prop_assume!(original != replacement);
        envelope.sign.replace_range(position..position + 1, &replacement);

        prop_assert!(matches!(opener.open(&envelope), Err(AuthError::SignatureMismatch)));
    }

    /// Property: timestamps beyond the window fail before any decryption
    #[test]
    fn prop_outside_window_is_stale(distance in 61i64..100_000, future in any::<bool>()) {
        let opener = common::opener_at(common::NOW);
        let ts = if future { common::NOW + distance } else { common::NOW - distance };
        let envelope = Envelope {
            timestamp: ts,
            sign: String::new(),
            en_data: String::new(),
            enc_payload: String::new(),
        };
        prop_assert!(matches!(opener.open(&envelope), Err(AuthError::StaleTimestamp)));
    }

    /// Property: ciphertext not a multiple of 16 bytes is malformed
    #[test]
    fn prop_misaligned_ciphertext(plaintext in arb_plaintext(), extra in 1usize..16) {
        let opener = common::opener_at(common::NOW);
        let mut envelope = seal(&opener.public_key(), &plaintext, common::NOW).unwrap();

        let mut raw = STANDARD.decode(&envelope.en_data).unwrap();
        raw.extend(std::iter::repeat(0u8).take(extra));
        envelope.en_data = STANDARD.encode(raw);

        prop_assert!(matches!(opener.open(&envelope), Err(AuthError::MalformedCiphertext)));
    }

    /// Property: garbage envelopes are rejected without panicking
    #[test]
    fn prop_garbage_never_panics(envelope in arb_garbage_envelope()) {
        let opener = common::opener_at(common::NOW);
        prop_assert!(opener.open(&envelope).is_err());
    }
}

// ============================================================================
// Padding
// ============================================================================

proptest! {
    /// Property: a valid pad of length p strips exactly p bytes
    #[test]
    fn prop_valid_padding_stripped(body in prop::collection::vec(any::<u8>(), 0..64), pad in 1u8..=16) {
        let mut buf = body.clone();
        buf.extend(std::iter::repeat(pad).take(usize::from(pad)));
        prop_assert_eq!(strip_padding(&buf).unwrap(), body.as_slice());
    }

    /// Property: a final byte of 0 or above the block size is rejected
    #[test]
    fn prop_invalid_pad_byte_rejected(body in prop::collection::vec(any::<u8>(), 16..64), last in prop_oneof![Just(0u8), 17u8..=255]) {
        let mut buf = body;
        buf.push(last);
        prop_assert!(matches!(strip_padding(&buf), Err(AuthError::InvalidPadding)));
    }
}

// ============================================================================
// Boundaries (explicit)
// ============================================================================

#[test]
fn test_boundary_exactly_sixty_seconds() {
    let opener = common::opener_at(common::NOW);
    for ts in [common::NOW - 60, common::NOW + 60] {
        let envelope = seal(&opener.public_key(), b"{}", ts).unwrap();
        assert!(opener.open(&envelope).is_ok());
    }
    for ts in [common::NOW - 61, common::NOW + 61] {
        let envelope = seal(&opener.public_key(), b"{}", ts).unwrap();
        assert!(matches!(opener.open(&envelope), Err(AuthError::StaleTimestamp)));
    }
}

#[test]
fn test_wire_shape() {
    let opener = common::opener_at(common::NOW);
    let envelope = seal(&opener.public_key(), b"{}", common::NOW).unwrap();
    let json = serde_json::to_value(&envelope).unwrap();

    assert_eq!(json["timestamp"], common::NOW);
    assert_eq!(json["sign"].as_str().unwrap().len(), 32);
    assert!(json["en_data"].is_string());
    assert!(json["enc_payload"].is_string());

    let parsed: Envelope = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, envelope);
}
