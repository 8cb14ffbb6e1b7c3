//! Trait boundary between the scan loop and contactless hardware.
//!
//! All traits use native `async fn` methods (Edition 2024 RPITIT); callers
//! are generic over the implementation, mock or real.

use crate::error::Result;
use nfcbridge_core::TagInfo;
use std::time::Duration;

/// A tag currently present in the reader's field.
///
/// Metadata getters are infallible: they report what the reader saw during
/// activation. Every command can fail, and a failed command usually means
/// the tag left the field; callers drop the tag rather than retry.
pub trait NfcTag: Send {
    /// Reader-reported product name.
    fn product(&self) -> &str;

    /// Reader-reported tag type.
    fn tag_type(&self) -> &str;

    /// Hardware identifier bytes.
    fn identifier(&self) -> &[u8];

    /// Whether the tag has structured (NDEF) storage.
    fn has_ndef(&self) -> bool;

    /// Attempt password authentication against the tag.
    ///
    /// Returns `Ok(false)` when the tag rejects the secret. Transport-level
    /// failures are errors; both are treated the same by callers.
    ///
    /// # Errors
    /// Returns an error if the tag stopped responding mid-command.
    async fn authenticate(&mut self, secret: &str) -> Result<bool>;

    /// Apply read protection with the given secret.
    ///
    /// # Errors
    /// Returns an error if the tag rejects the command, including when it
    /// is already protected.
    async fn protect(&mut self, secret: &str) -> Result<()>;

    /// Erase all stored content, overwriting memory with `wipe`.
    ///
    /// Returns `Ok(false)` when the tag refuses the format command.
    ///
    /// # Errors
    /// Returns an error if the tag stopped responding mid-command.
    async fn format(&mut self, wipe: u8) -> Result<bool>;

    /// Read the first structured-storage record, if any.
    ///
    /// # Errors
    /// Returns an error if the record list cannot be read.
    async fn first_record(&mut self) -> Result<Option<String>>;

    /// Replace the stored record list with a single text record.
    ///
    /// # Errors
    /// Returns `ReaderError::PayloadTooLarge` when the text does not fit,
    /// or a command failure when the hardware rejects the write.
    async fn write_record(&mut self, text: &str) -> Result<()>;

    /// Identifying metadata, captured once at the top of a scan cycle.
    fn info(&self) -> TagInfo {
        TagInfo::new(self.product(), self.tag_type(), self.identifier())
    }
}

/// A contactless reader producing at most one tag per scan cycle.
pub trait NfcReader: Send {
    type Tag: NfcTag;

    /// Wait up to `timeout` for a tag to enter the field.
    ///
    /// `Ok(None)` means no tag showed up in time; the scan loop treats this
    /// as an idle cycle, not a failure.
    ///
    /// # Errors
    /// Returns an error if the reader itself went away.
    async fn wait_for_tag(&mut self, timeout: Duration) -> Result<Option<Self::Tag>>;
}

/// LED/buzzer feedback collaborator. Fire-and-forget: the scan loop never
/// acts on the result of a signal.
pub trait FeedbackDevice: Send {
    /// Emit `pulses` short pulses, then hold the device quiet for `hold`.
    async fn signal(&mut self, pulses: u8, hold: Duration);
}
