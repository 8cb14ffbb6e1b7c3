//! Remote command execution against a presented tag.
//!
//! A command is consumed exactly once: success or failure, it never goes
//! back on the queue. Failures are reported through local feedback and
//! the log, not over the broker.

use nfcbridge_core::TagRecord;
use nfcbridge_core::constants::WIPE_PATTERN;
use nfcbridge_payload::PayloadCipher;
use nfcbridge_reader::NfcTag;
use tracing::{debug, error, info, warn};

/// A queued operation waiting for the next presented tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagCommand {
    /// Encrypt `record` and store it, wiping the tag first.
    Write {
        record: TagRecord,
        authenticate_password: Option<String>,
    },
    /// Erase the tag's stored content.
    Wipe,
}

/// Execute one command against the tag in the field. Returns whether the
/// command fully succeeded.
pub async fn process_command<T: NfcTag>(
    tag: &mut T,
    command: TagCommand,
    cipher: &PayloadCipher,
    reader_secret: Option<&str>,
) -> bool {
    match command {
        TagCommand::Write {
            record,
            authenticate_password,
        } => write_tag(tag, &record, authenticate_password.as_deref(), cipher, reader_secret).await,
        TagCommand::Wipe => wipe_tag(tag, reader_secret).await,
    }
}

/// Erase the tag: authenticate with the reader secret when one is
/// configured, then format with the wipe pattern.
async fn wipe_tag<T: NfcTag>(tag: &mut T, reader_secret: Option<&str>) -> bool {
    if let Some(secret) = reader_secret {
        match tag.authenticate(secret).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("wipe aborted, tag rejected authentication");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "wipe aborted, authentication command failed");
                return false;
            }
        }
    }
    match tag.format(WIPE_PATTERN).await {
        Ok(true) => {
            info!("tag wiped");
            true
        }
        Ok(false) => {
            warn!("tag refused format command");
            false
        }
        Err(e) => {
            warn!(error = %e, "format command failed");
            false
        }
    }
}

/// Provision the tag with an encrypted record.
///
/// When the request carries a password the tag is authenticated with it
/// first. Read protection is then (re-)applied under the configured
/// reader secret whenever one is set, best-effort: a tag that is already
/// protected rejects `protect`, which is fine. The wipe is a hard
/// precondition: a tag that cannot be erased is not written.
async fn write_tag<T: NfcTag>(
    tag: &mut T,
    record: &TagRecord,
    password: Option<&str>,
    cipher: &PayloadCipher,
    reader_secret: Option<&str>,
) -> bool {
    if let Some(password) = password {
        match tag.authenticate(password).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("write aborted, tag rejected authentication");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "write aborted, authentication command failed");
                return false;
            }
        }
    }

    if let Some(secret) = reader_secret
        && let Err(e) = tag.protect(secret).await
    {
        debug!(error = %e, "protect not applied");
    }

    if !wipe_tag(tag, reader_secret).await {
        return false;
    }

    let token = match cipher.encode(record) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "record could not be encoded");
            return false;
        }
    };
    match tag.write_record(&token).await {
        Ok(()) => {
            info!(id = %record.id, "tag written");
            true
        }
        Err(e) => {
            // Oversized payload or the tag left the field; either way the
            // tag stays wiped.
            error!(error = %e, "write command failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfcbridge_reader::mock::MockTag;
    use serde_json::json;

    const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

    fn cipher() -> PayloadCipher {
        PayloadCipher::new(TEST_KEY).unwrap()
    }

    #[tokio::test]
    async fn test_wipe_formats_with_pattern() {
        let tag = MockTag::new(vec![0x04]).with_record("old");
        let probe = tag.probe();
        let mut tag = tag;

        assert!(process_command(&mut tag, TagCommand::Wipe, &cipher(), None).await);
        assert!(probe.records().is_empty());
        assert_eq!(probe.last_wipe(), Some(0xFF));
    }

    #[tokio::test]
    async fn test_wipe_authenticates_with_reader_secret() {
        let mut tag = MockTag::new(vec![0x04]).with_password("s3cret");
        assert!(process_command(&mut tag, TagCommand::Wipe, &cipher(), Some("s3cret")).await);

        let mut tag = MockTag::new(vec![0x04]).with_password("s3cret");
        assert!(!process_command(&mut tag, TagCommand::Wipe, &cipher(), Some("wrong")).await);
    }

    #[tokio::test]
    async fn test_wipe_fails_when_format_refused() {
        let mut tag = MockTag::new(vec![0x04]).failing_format();
        assert!(!process_command(&mut tag, TagCommand::Wipe, &cipher(), None).await);
    }

    #[tokio::test]
    async fn test_write_stores_decodable_record() {
        let c = cipher();
        let record = TagRecord::new("abc12")
            .with_valid_till(1_700_000_000)
            .with_data(json!({"door": 7}));
        let tag = MockTag::new(vec![0x04]).with_record("previous content");
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: record.clone(),
            authenticate_password: None,
        };
        assert!(process_command(&mut tag, command, &c, None).await);

        let stored = probe.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(c.decode(&stored[0]).unwrap(), record);
        // the wipe precondition ran
        assert_eq!(probe.last_wipe(), Some(0xFF));
    }

    #[tokio::test]
    async fn test_write_applies_configured_protection() {
        // Fresh tag, no caller password: protection still comes from the
        // configured reader secret.
        let tag = MockTag::new(vec![0x04]);
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12"),
            authenticate_password: None,
        };
        assert!(process_command(&mut tag, command, &cipher(), Some("s3cret")).await);
        assert!(probe.is_protected());
        assert_eq!(probe.records().len(), 1);
    }

    #[tokio::test]
    async fn test_write_protects_with_reader_secret_not_caller_password() {
        let tag = MockTag::new(vec![0x04]).with_password("caller");
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12"),
            authenticate_password: Some("caller".to_string()),
        };
        assert!(process_command(&mut tag, command, &cipher(), Some("s3cret")).await);
        assert!(probe.is_protected());

        // Subsequent scans authenticate with the configured secret.
        assert!(tag.authenticate("s3cret").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_without_reader_secret_leaves_tag_unprotected() {
        let tag = MockTag::new(vec![0x04]);
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12"),
            authenticate_password: None,
        };
        assert!(process_command(&mut tag, command, &cipher(), None).await);
        assert!(!probe.is_protected());
        assert_eq!(probe.records().len(), 1);
    }

    #[tokio::test]
    async fn test_write_tolerates_already_protected() {
        let tag = MockTag::new(vec![0x04])
            .with_password("s3cret")
            .already_protected();
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12"),
            authenticate_password: None,
        };
        assert!(process_command(&mut tag, command, &cipher(), Some("s3cret")).await);
        assert_eq!(probe.records().len(), 1);
    }

    #[tokio::test]
    async fn test_write_rejected_password_aborts_before_wipe() {
        let tag = MockTag::new(vec![0x04])
            .with_password("right")
            .with_record("untouched");
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12"),
            authenticate_password: Some("wrong".to_string()),
        };
        assert!(!process_command(&mut tag, command, &cipher(), None).await);
        assert_eq!(probe.records(), vec!["untouched".to_string()]);
        assert_eq!(probe.last_wipe(), None);
    }

    #[tokio::test]
    async fn test_oversized_record_fails_and_leaves_tag_wiped() {
        let tag = MockTag::new(vec![0x04]).with_capacity(16).with_record("old");
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12").with_data(json!("x".repeat(600))),
            authenticate_password: None,
        };
        assert!(!process_command(&mut tag, command, &cipher(), None).await);
        assert!(probe.records().is_empty());
        assert_eq!(probe.last_wipe(), Some(0xFF));
    }

    #[tokio::test]
    async fn test_failed_wipe_precondition_blocks_write() {
        let tag = MockTag::new(vec![0x04]).failing_format();
        let probe = tag.probe();
        let mut tag = tag;

        let command = TagCommand::Write {
            record: TagRecord::new("abc12"),
            authenticate_password: None,
        };
        assert!(!process_command(&mut tag, command, &cipher(), None).await);
        assert!(probe.records().is_empty());
    }
}
