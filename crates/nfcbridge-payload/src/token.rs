//! Authenticated token envelope.
//!
//! Layout before base64url encoding:
//!
//! ```text
//! version(1) || issued_at_be_u64(8) || nonce(12) || ciphertext+tag
//! ```
//!
//! The version byte and timestamp are bound as associated data, so any
//! modification of the header fails authentication along with the body.
//! The timestamp is the freshness token; it is not currently enforced on
//! decode but travels with every payload.

use crate::error::{DecodeError, EncodeError};
use base64::alphabet;
use base64::engine::{self, Engine};
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;

/// Token format version.
const TOKEN_VERSION: u8 = 0x01;

/// Nonce size in bytes (96 bits for ChaCha20-Poly1305).
pub(crate) const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size in bytes.
pub(crate) const TAG_SIZE: usize = 16;

/// version + issued_at header size in bytes.
const HEADER_SIZE: usize = 1 + 8;

/// Encodes without padding, accepts tokens and keys with or without it.
pub(crate) const B64: engine::GeneralPurpose = engine::GeneralPurpose::new(
    &alphabet::URL_SAFE,
    engine::GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(engine::DecodePaddingMode::Indifferent),
);

/// Encrypt `plaintext` into a token string.
pub(crate) fn seal(
    cipher: &ChaCha20Poly1305,
    plaintext: &[u8],
    issued_at: i64,
) -> Result<String, EncodeError> {
    let mut header = [0u8; HEADER_SIZE];
    header[0] = TOKEN_VERSION;
    header[1..].copy_from_slice(&(issued_at as u64).to_be_bytes());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|e| EncodeError::Encrypt(e.to_string()))?;

    let mut raw = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + ciphertext.len());
    raw.extend_from_slice(&header);
    raw.extend_from_slice(&nonce_bytes);
    raw.extend_from_slice(&ciphertext);

    Ok(B64.encode(raw))
}

/// Decrypt a token string. Every failure mode collapses into
/// [`DecodeError::InvalidToken`]: tag readers cannot act differently on
/// "garbage" versus "tampered".
pub(crate) fn open(cipher: &ChaCha20Poly1305, token: &str) -> Result<Vec<u8>, DecodeError> {
    let raw = B64
        .decode(token.trim())
        .map_err(|_| DecodeError::InvalidToken)?;

    if raw.len() < HEADER_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(DecodeError::InvalidToken);
    }
    if raw[0] != TOKEN_VERSION {
        return Err(DecodeError::InvalidToken);
    }

    let (header, rest) = raw.split_at(HEADER_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| DecodeError::InvalidToken)
}
