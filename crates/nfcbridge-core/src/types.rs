//! Shared data model: tag records, tag metadata and scan outcomes.

use crate::constants::TAG_TOPIC;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;

/// The structured record stored (encrypted) on a tag.
///
/// `id` and `valid_till` are always present in the wire form; `data` is
/// optional and consumed greedily after the second delimiter, so it may
/// itself contain spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Payload identifier, also used for the per-tag event topic.
    pub id: String,

    /// Expiry as unix seconds; 0 means the record never expires.
    pub valid_till: i64,

    /// Optional opaque value. Structured values survive a JSON round-trip;
    /// plain text that is not valid JSON is kept as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TagRecord {
    /// Create a record that never expires and carries no data.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            valid_till: 0,
            data: None,
        }
    }

    /// Set the expiry timestamp (unix seconds, 0 = never).
    #[must_use]
    pub fn with_valid_till(mut self, valid_till: i64) -> Self {
        self.valid_till = valid_till;
        self
    }

    /// Attach a data value.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The expiry instant, if the record expires and the timestamp is
    /// representable.
    pub fn valid_till_utc(&self) -> Option<DateTime<Utc>> {
        if self.valid_till == 0 {
            return None;
        }
        DateTime::from_timestamp(self.valid_till, 0)
    }

    /// Whether the record counts as expired at `now`. A `valid_till` equal
    /// to `now` is already expired; 0 never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_till != 0 && self.valid_till <= now.timestamp()
    }
}

/// Physical tag metadata captured at the top of a scan cycle, carried by
/// every outcome regardless of how far classification proceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    /// Reader-reported product name.
    pub product: String,

    /// Reader-reported tag type.
    #[serde(rename = "type")]
    pub tag_type: String,

    /// Hardware identifier as lowercase hex.
    pub id: String,
}

impl TagInfo {
    pub fn new(
        product: impl Into<String>,
        tag_type: impl Into<String>,
        identifier: &[u8],
    ) -> Self {
        Self {
            product: product.into(),
            tag_type: tag_type.into(),
            id: identifier.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

/// Terminal states of one classification attempt.
///
/// Variants that decoded a record carry it; the record is never mutated
/// after classification completes.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Decrypted, well-formed and not expired.
    Valid { record: TagRecord },

    /// Ciphertext failed authentication: tampered, wrong key, or not
    /// produced by this scheme.
    Invalid,

    /// Decrypted but the plaintext is not a recognized record.
    UnknownPayloadType,

    /// Decrypted and well-formed but past its expiry.
    Expired { record: TagRecord },

    /// Tag could not be scanned (removed too fast, authentication failed,
    /// or no record present).
    ScanError,

    /// Tag has no structured storage to hold a record.
    NoNdef,
}

impl ScanOutcome {
    /// Stable status name used in published events.
    pub fn status(&self) -> &'static str {
        match self {
            ScanOutcome::Valid { .. } => "valid",
            ScanOutcome::Invalid => "invalid",
            ScanOutcome::UnknownPayloadType => "unknown_payload_type",
            ScanOutcome::Expired { .. } => "expired",
            ScanOutcome::ScanError => "scan_error",
            ScanOutcome::NoNdef => "no_ndef",
        }
    }

    /// The decoded record, for outcomes that carry one.
    pub fn record(&self) -> Option<&TagRecord> {
        match self {
            ScanOutcome::Valid { record } | ScanOutcome::Expired { record } => Some(record),
            _ => None,
        }
    }

    /// Local feedback pulse count for this outcome.
    pub fn pulse_count(&self) -> u8 {
        match self {
            ScanOutcome::Valid { .. } => 1,
            ScanOutcome::ScanError | ScanOutcome::NoNdef => 2,
            ScanOutcome::Invalid
            | ScanOutcome::UnknownPayloadType
            | ScanOutcome::Expired { .. } => 3,
        }
    }

    /// How long the feedback device holds after signalling this outcome.
    pub fn feedback_hold(&self) -> Duration {
        match self {
            ScanOutcome::ScanError | ScanOutcome::NoNdef => Duration::from_secs(3),
            _ => Duration::from_secs(5),
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status())
    }
}

/// One completed scan: outcome plus the physical tag it came from.
/// Created fresh per scan attempt and consumed by the publish step.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub tag: TagInfo,
    pub outcome: ScanOutcome,
}

impl ScanReport {
    pub fn new(tag: TagInfo, outcome: ScanOutcome) -> Self {
        Self { tag, outcome }
    }

    /// Event topic: `<base>/tag/<id>` when a payload id was decoded,
    /// `<base>/tag` otherwise.
    pub fn event_topic(&self, base_topic: &str) -> String {
        match self.outcome.record() {
            Some(record) => format!("{base_topic}/{TAG_TOPIC}/{}", record.id),
            None => format!("{base_topic}/{TAG_TOPIC}"),
        }
    }

    /// Event body: status, tag metadata, and the decoded record fields when
    /// present, with the expiry in both raw and human-readable UTC form.
    pub fn to_event_json(&self) -> Value {
        let mut event = json!({
            "status": self.outcome.status(),
            "tag": self.tag,
        });

        if let Some(record) = self.outcome.record() {
            let obj = event.as_object_mut().expect("event is an object");
            obj.insert("id".into(), Value::String(record.id.clone()));
            obj.insert("valid_till".into(), json!(record.valid_till));
            if let Some(data) = &record.data {
                obj.insert("data".into(), data.clone());
            }
            if let Some(dt) = record.valid_till_utc() {
                obj.insert(
                    "valid_till_dt_utc".into(),
                    Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                );
            }
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_tag_info_hex_id() {
        let info = TagInfo::new("NTAG215", "Type2Tag", &[0x04, 0xAB, 0xCD, 0xEF]);
        assert_eq!(info.id, "04abcdef");
    }

    #[rstest]
    #[case(0, 0, false)] // never expires
    #[case(100, 100, true)] // exactly now is expired
    #[case(100, 99, false)] // one second in the future
    #[case(100, 101, true)]
    fn test_expiry_boundary(#[case] valid_till: i64, #[case] now: i64, #[case] expired: bool) {
        let record = TagRecord::new("x").with_valid_till(valid_till);
        let now = DateTime::from_timestamp(now, 0).unwrap();
        assert_eq!(record.is_expired_at(now), expired);
    }

    #[test]
    fn test_valid_till_utc_zero_is_none() {
        assert_eq!(TagRecord::new("x").valid_till_utc(), None);
    }

    #[rstest]
    #[case(ScanOutcome::Invalid, 3)]
    #[case(ScanOutcome::UnknownPayloadType, 3)]
    #[case(ScanOutcome::ScanError, 2)]
    #[case(ScanOutcome::NoNdef, 2)]
    fn test_pulse_counts(#[case] outcome: ScanOutcome, #[case] pulses: u8) {
        assert_eq!(outcome.pulse_count(), pulses);
    }

    #[test]
    fn test_valid_outcome_pulse_and_hold() {
        let outcome = ScanOutcome::Valid {
            record: TagRecord::new("abc"),
        };
        assert_eq!(outcome.pulse_count(), 1);
        assert_eq!(outcome.feedback_hold(), Duration::from_secs(5));
        assert_eq!(ScanOutcome::ScanError.feedback_hold(), Duration::from_secs(3));
    }

    #[test]
    fn test_event_topic_with_and_without_id() {
        let tag = TagInfo::new("p", "t", &[0x01]);
        let with_id = ScanReport::new(
            tag.clone(),
            ScanOutcome::Valid {
                record: TagRecord::new("abc12"),
            },
        );
        assert_eq!(with_id.event_topic("nfc2mqtt"), "nfc2mqtt/tag/abc12");

        let without_id = ScanReport::new(tag, ScanOutcome::Invalid);
        assert_eq!(without_id.event_topic("nfc2mqtt"), "nfc2mqtt/tag");
    }

    #[test]
    fn test_event_json_valid_record() {
        let record = TagRecord::new("abc12")
            .with_valid_till(1_700_000_000)
            .with_data(json!({"door": 7}));
        let report = ScanReport::new(
            TagInfo::new("NTAG215", "Type2Tag", &[0x04, 0xAB]),
            ScanOutcome::Valid { record },
        );

        let event = report.to_event_json();
        assert_eq!(event["status"], "valid");
        assert_eq!(event["tag"]["product"], "NTAG215");
        assert_eq!(event["tag"]["type"], "Type2Tag");
        assert_eq!(event["tag"]["id"], "04ab");
        assert_eq!(event["id"], "abc12");
        assert_eq!(event["valid_till"], 1_700_000_000_i64);
        assert_eq!(event["data"]["door"], 7);
        assert_eq!(event["valid_till_dt_utc"], "2023-11-14 22:13:20");
    }

    #[test]
    fn test_event_json_scan_error_has_no_record_fields() {
        let report = ScanReport::new(TagInfo::new("p", "t", &[0x01]), ScanOutcome::ScanError);
        let event = report.to_event_json();
        assert_eq!(event["status"], "scan_error");
        assert!(event.get("id").is_none());
        assert!(event.get("valid_till").is_none());
        assert!(event.get("valid_till_dt_utc").is_none());
    }
}
