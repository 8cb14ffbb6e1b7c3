//! Tag payload protocol: a compact authenticated-encryption scheme mapping
//! a [`TagRecord`](nfcbridge_core::TagRecord) to and from the text blob
//! stored on a tag.
//!
//! The wire form is `"<id> <valid_till>[ <data>]"` encrypted with
//! ChaCha20-Poly1305 under a process-wide key and wrapped as a base64url
//! token carrying a version byte and an issue timestamp. Decryption either
//! reproduces the plaintext byte-for-byte or fails as
//! [`DecodeError::InvalidToken`].

pub mod codec;
pub mod error;
mod token;

pub use codec::PayloadCipher;
pub use error::{DecodeError, EncodeError, KeyError};
