use thiserror::Error;

/// Startup errors for a misconfigured payload key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Encryption key is not valid base64url: {0}")]
    InvalidEncoding(String),

    #[error("Encryption key must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors while producing a token from a record.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to serialize data field: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Encryption failed: {0}")]
    Encrypt(String),
}

/// Errors while turning a token back into a record.
///
/// These never propagate as failures out of a scan cycle; each maps
/// deterministically to a scan outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Tampered, wrong key, or not produced by this scheme.
    #[error("Token failed authentication")]
    InvalidToken,

    /// Plaintext did not split into 2 or 3 fields.
    #[error("Expected 2 or 3 payload fields, got {count}")]
    MalformedFieldCount { count: usize },

    /// Expiry field was present but not an integer.
    #[error("Expiry field is not an integer: {field:?}")]
    MalformedExpiry { field: String },
}
