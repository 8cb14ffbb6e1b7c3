//! Inbound control-message parsing and routing.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use nfcbridge_core::constants::{WIPE_TAG_TOPIC, WRITE_TAG_TOPIC};

/// A parsed inbound control message.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Write(WriteRequest),
    Wipe,
}

/// Body of a `write_tag` control message. Every field is optional;
/// a malformed body degrades to all defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriteRequest {
    pub id: Option<String>,
    pub valid_till: Option<i64>,
    pub data: Option<Value>,
    pub authenticate_password: Option<String>,
}

/// Consumer of parsed control commands, implemented by the scan side.
pub trait ControlHandler: Send {
    fn handle(&self, command: ControlCommand);
}

/// The control topics under a base prefix, and the routing between them.
#[derive(Debug, Clone)]
pub struct ControlTopics {
    write_tag: String,
    wipe_tag: String,
}

impl ControlTopics {
    pub fn new(base_topic: &str) -> Self {
        Self {
            write_tag: format!("{base_topic}/{WRITE_TAG_TOPIC}"),
            wipe_tag: format!("{base_topic}/{WIPE_TAG_TOPIC}"),
        }
    }

    pub fn write_tag(&self) -> &str {
        &self.write_tag
    }

    pub fn wipe_tag(&self) -> &str {
        &self.wipe_tag
    }

    /// Subscription list, in registration order.
    pub fn subscriptions(&self) -> [&str; 2] {
        [&self.write_tag, &self.wipe_tag]
    }

    /// Map an inbound message to a command. `None` for topics this router
    /// does not own.
    pub fn route(&self, topic: &str, payload: &[u8]) -> Option<ControlCommand> {
        if topic == self.write_tag {
            Some(ControlCommand::Write(parse_write_request(payload)))
        } else if topic == self.wipe_tag {
            // Body ignored
            Some(ControlCommand::Wipe)
        } else {
            None
        }
    }
}

/// Parse a `write_tag` body. Malformed JSON is treated as an empty object,
/// so every field falls back to its default.
pub fn parse_write_request(payload: &[u8]) -> WriteRequest {
    serde_json::from_slice(payload).unwrap_or_else(|e| {
        warn!(error = %e, "malformed write_tag body, using defaults");
        WriteRequest::default()
    })
}
