//! Configuration structures consumed by the bridge.
//!
//! The binary loads these from a YAML file plus environment overrides; the
//! core only defines the shape and the defaults. The encryption key is the
//! one setting with no default: without it the process must not start.

use crate::constants::{DEFAULT_BASE_TOPIC, DEFAULT_ID_LENGTH, DEFAULT_KEEPALIVE_SECS, DEFAULT_MQTT_PORT};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub mqtt: MqttConfig,

    pub nfc: NfcConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Validate the settings that cannot be expressed through serde alone.
    ///
    /// # Errors
    /// Returns `Error::MissingConfig` when the encryption key is empty and
    /// `Error::Config` for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.nfc.encrypt_key.is_empty() {
            return Err(Error::MissingConfig("nfc.encrypt_key".to_string()));
        }
        if self.nfc.id_length == 0 {
            return Err(Error::Config(
                "nfc.id_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Broker session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Prefix for every subscribed and published topic.
    #[serde(default = "default_base_topic")]
    pub topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            keepalive_secs: default_keepalive(),
            username: None,
            password: None,
            topic: default_base_topic(),
        }
    }
}

/// Reader-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NfcConfig {
    /// Reader backend identifier.
    #[serde(default = "default_reader")]
    pub reader: String,

    /// Shared secret for hardware-level tag authentication and read
    /// protection. Optional; when unset tags are neither authenticated nor
    /// protected.
    #[serde(default)]
    pub authenticate_password: Option<String>,

    /// Symmetric payload key, 32 bytes base64url. Required.
    pub encrypt_key: String,

    /// Length of generated payload ids for write commands without one.
    #[serde(default = "default_id_length")]
    pub id_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

fn default_keepalive() -> u64 {
    DEFAULT_KEEPALIVE_SECS
}

fn default_base_topic() -> String {
    DEFAULT_BASE_TOPIC.to_string()
}

fn default_reader() -> String {
    "mock".to_string()
}

fn default_id_length() -> usize {
    DEFAULT_ID_LENGTH
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_applies_defaults() {
        let cfg: BridgeConfig = serde_yaml_like_minimal();
        assert_eq!(cfg.mqtt.host, "localhost");
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.mqtt.keepalive_secs, 60);
        assert_eq!(cfg.mqtt.topic, "nfc2mqtt");
        assert_eq!(cfg.nfc.reader, "mock");
        assert_eq!(cfg.nfc.id_length, 5);
        assert_eq!(cfg.logging.level, "info");
        cfg.validate().unwrap();
    }

    fn serde_yaml_like_minimal() -> BridgeConfig {
        serde_json::from_value(serde_json::json!({
            "nfc": { "encrypt_key": "a".repeat(43) }
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_encrypt_key_is_rejected() {
        let cfg = serde_json::from_value::<BridgeConfig>(serde_json::json!({
            "nfc": {}
        }));
        assert!(cfg.is_err());
    }

    #[test]
    fn test_empty_encrypt_key_fails_validation() {
        let cfg: BridgeConfig = serde_json::from_value(serde_json::json!({
            "nfc": { "encrypt_key": "" }
        }))
        .unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(Error::MissingConfig(key)) if key == "nfc.encrypt_key"
        ));
    }

    #[test]
    fn test_zero_id_length_fails_validation() {
        let cfg: BridgeConfig = serde_json::from_value(serde_json::json!({
            "nfc": { "encrypt_key": "k", "id_length": 0 }
        }))
        .unwrap();
        assert!(cfg.validate().is_err());
    }
}
