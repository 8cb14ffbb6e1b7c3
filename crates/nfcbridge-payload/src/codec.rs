//! Record-to-token codec.

use crate::error::{DecodeError, EncodeError, KeyError};
use crate::token;
use base64::engine::Engine;
use chacha20poly1305::aead::KeyInit;
use chacha20poly1305::ChaCha20Poly1305;
use chrono::Utc;
use nfcbridge_core::TagRecord;
use serde_json::Value;
use std::fmt;

/// Key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Process-wide payload cipher, constructed once at startup from the
/// configured key.
#[derive(Clone)]
pub struct PayloadCipher {
    cipher: ChaCha20Poly1305,
}

impl fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadCipher").finish_non_exhaustive()
    }
}

impl PayloadCipher {
    /// Build a cipher from a base64url-encoded 32-byte key.
    ///
    /// # Errors
    /// Returns `KeyError` for anything that is not exactly 32 bytes of
    /// valid base64url. This is a fatal configuration error.
    pub fn new(key: &str) -> Result<Self, KeyError> {
        let raw = token::B64
            .decode(key.trim())
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        if raw.len() != KEY_SIZE {
            return Err(KeyError::InvalidLength {
                expected: KEY_SIZE,
                actual: raw.len(),
            });
        }
        Ok(Self {
            cipher: ChaCha20Poly1305::new(raw.as_slice().into()),
        })
    }

    /// Serialize and encrypt a record into a token string.
    ///
    /// # Errors
    /// Returns `EncodeError` if the data field cannot be JSON-serialized or
    /// encryption itself fails.
    pub fn encode(&self, record: &TagRecord) -> Result<String, EncodeError> {
        let plaintext = wire_plaintext(record)?;
        token::seal(
            &self.cipher,
            plaintext.as_bytes(),
            Utc::now().timestamp(),
        )
    }

    /// Decrypt and parse a token back into a record.
    ///
    /// # Errors
    /// - `InvalidToken`: authentication failed (tampered, wrong key, or not
    ///   produced by this scheme).
    /// - `MalformedFieldCount`: plaintext did not split into 2 or 3 fields.
    /// - `MalformedExpiry`: the second field is not an integer.
    pub fn decode(&self, ciphertext: &str) -> Result<TagRecord, DecodeError> {
        let plaintext = token::open(&self.cipher, ciphertext)?;
        // The fields are space-delimited text; authenticated non-UTF-8
        // plaintext cannot contain them.
        let text = String::from_utf8(plaintext)
            .map_err(|_| DecodeError::MalformedFieldCount { count: 0 })?;
        parse_wire(&text)
    }
}

/// `"<id> <valid_till>"`, then `" <data>"` only when data is present, with
/// structured data JSON-serialized first.
fn wire_plaintext(record: &TagRecord) -> Result<String, EncodeError> {
    let mut plaintext = format!("{} {}", record.id, record.valid_till);
    if let Some(data) = &record.data {
        plaintext.push(' ');
        plaintext.push_str(&serde_json::to_string(data)?);
    }
    Ok(plaintext)
}

/// Split on the first two delimiters; the third field swallows the rest,
/// so data may contain spaces.
fn parse_wire(text: &str) -> Result<TagRecord, DecodeError> {
    let fields: Vec<&str> = text.splitn(3, ' ').collect();
    if fields.len() < 2 {
        return Err(DecodeError::MalformedFieldCount {
            count: fields.len(),
        });
    }

    let valid_till: i64 = fields[1]
        .parse()
        .map_err(|_| DecodeError::MalformedExpiry {
            field: fields[1].to_string(),
        })?;

    // JSON-decode the data field when possible; keep it as a raw string
    // otherwise. Never an error.
    let data = fields.get(2).map(|raw| {
        serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String((*raw).to_string()))
    });

    Ok(TagRecord {
        id: fields[0].to_string(),
        valid_till,
        data,
    })
}
