//! Error types for reader operations.

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur while talking to a tag or reader.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// Reader is not connected or has been disconnected.
    #[error("Reader disconnected: {device}")]
    Disconnected { device: String },

    /// A tag command was rejected or failed mid-flight.
    #[error("Tag command failed: {message}")]
    CommandFailed { message: String },

    /// Ciphertext does not fit the tag's storage.
    #[error("Payload of {size} bytes exceeds tag capacity of {capacity} bytes")]
    PayloadTooLarge { size: usize, capacity: usize },
}

impl ReaderError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new command failure error.
    pub fn command_failed(message: impl Into<String>) -> Self {
        Self::CommandFailed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ReaderError::disconnected("mock").to_string(),
            "Reader disconnected: mock"
        );
        assert_eq!(
            ReaderError::command_failed("no ndef").to_string(),
            "Tag command failed: no ndef"
        );
        assert_eq!(
            ReaderError::PayloadTooLarge {
                size: 600,
                capacity: 496
            }
            .to_string(),
            "Payload of 600 bytes exceeds tag capacity of 496 bytes"
        );
    }
}
