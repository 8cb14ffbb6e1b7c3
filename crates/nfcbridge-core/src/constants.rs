use std::time::Duration;

/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default MQTT keepalive interval in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 60;

/// Default base topic for all published and subscribed topics.
pub const DEFAULT_BASE_TOPIC: &str = "nfc2mqtt";

/// Default length of generated tag payload ids.
pub const DEFAULT_ID_LENGTH: usize = 5;

/// How long one scan cycle waits for a tag before giving the loop back
/// to queue flushing and command intake.
pub const TAG_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Fixed delay between broker reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Byte pattern written over tag memory when formatting.
pub const WIPE_PATTERN: u8 = 0xFF;

/// Control topic suffix for write commands.
pub const WRITE_TAG_TOPIC: &str = "write_tag";

/// Control topic suffix for wipe commands.
pub const WIPE_TAG_TOPIC: &str = "wipe_tag";

/// Event topic suffix for scan outcomes.
pub const TAG_TOPIC: &str = "tag";
