//! Tag classification: one presented tag in, one terminal outcome out.
//!
//! Classification never fails. Hardware errors, rejected authentication
//! and undecodable payloads are all legitimate outcomes, logged and
//! published like any other scan.

use chrono::{DateTime, Utc};
use nfcbridge_core::ScanOutcome;
use nfcbridge_payload::{DecodeError, PayloadCipher};
use nfcbridge_reader::NfcTag;
use tracing::{debug, warn};

/// Classify a tag currently in the field.
///
/// Order matters: authentication (when a secret is configured) comes
/// before any storage access, and the expiry check runs only on a record
/// that already decoded cleanly.
pub async fn classify_tag<T: NfcTag>(
    tag: &mut T,
    cipher: &PayloadCipher,
    auth_secret: Option<&str>,
    now: DateTime<Utc>,
) -> ScanOutcome {
    if let Some(secret) = auth_secret {
        match tag.authenticate(secret).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("tag rejected authentication");
                return ScanOutcome::ScanError;
            }
            Err(e) => {
                warn!(error = %e, "authentication command failed");
                return ScanOutcome::ScanError;
            }
        }
    }

    if !tag.has_ndef() {
        return ScanOutcome::NoNdef;
    }

    let payload = match tag.first_record().await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!("tag has no stored record");
            return ScanOutcome::ScanError;
        }
        Err(e) => {
            warn!(error = %e, "record read failed");
            return ScanOutcome::ScanError;
        }
    };

    let record = match cipher.decode(&payload) {
        Ok(record) => record,
        Err(DecodeError::InvalidToken) => {
            debug!("payload failed authentication");
            return ScanOutcome::Invalid;
        }
        Err(e @ (DecodeError::MalformedFieldCount { .. } | DecodeError::MalformedExpiry { .. })) => {
            debug!(error = %e, "payload decrypted but is not a tag record");
            return ScanOutcome::UnknownPayloadType;
        }
    };

    if record.is_expired_at(now) {
        ScanOutcome::Expired { record }
    } else {
        ScanOutcome::Valid { record }
    }
}
