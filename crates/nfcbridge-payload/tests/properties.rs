//! Codec properties: round-trip fidelity and tamper detection.

use base64::alphabet;
use base64::engine::{self, Engine};
use nfcbridge_core::TagRecord;
use nfcbridge_payload::{DecodeError, PayloadCipher};
use proptest::prelude::*;
use serde_json::json;

const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

const B64: engine::GeneralPurpose = engine::GeneralPurpose::new(
    &alphabet::URL_SAFE,
    engine::GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(engine::DecodePaddingMode::Indifferent),
);

fn record_strategy() -> impl Strategy<Value = TagRecord> {
    let data = prop_oneof![
        Just(None),
        "[a-zA-Z0-9 .,-]{0,40}".prop_map(|s| Some(json!(s))),
        any::<i64>().prop_map(|n| Some(json!(n))),
        ("[a-z]{1,8}", any::<u32>()).prop_map(|(k, v)| Some(json!({ k: v }))),
    ];
    ("[a-zA-Z0-9]{1,16}", 0i64..=4_102_444_800, data).prop_map(|(id, valid_till, data)| {
        TagRecord {
            id,
            valid_till,
            data,
        }
    })
}

proptest! {
    #[test]
    fn round_trip_reproduces_record(record in record_strategy()) {
        let cipher = PayloadCipher::new(TEST_KEY).unwrap();
        let token = cipher.encode(&record).unwrap();
        prop_assert_eq!(cipher.decode(&token).unwrap(), record);
    }

    #[test]
    fn any_flipped_byte_fails_as_invalid_token(
        record in record_strategy(),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let cipher = PayloadCipher::new(TEST_KEY).unwrap();
        let token = cipher.encode(&record).unwrap();

        let mut raw = B64.decode(&token).unwrap();
        let index = position.index(raw.len());
        raw[index] ^= 1 << bit;
        let tampered = B64.encode(&raw);

        prop_assert_eq!(cipher.decode(&tampered), Err(DecodeError::InvalidToken));
    }

    #[test]
    fn decode_under_a_different_key_fails(record in record_strategy()) {
        let cipher = PayloadCipher::new(TEST_KEY).unwrap();
        let other = PayloadCipher::new(&B64.encode([0x42u8; 32])).unwrap();
        let token = cipher.encode(&record).unwrap();
        prop_assert_eq!(other.decode(&token), Err(DecodeError::InvalidToken));
    }
}
