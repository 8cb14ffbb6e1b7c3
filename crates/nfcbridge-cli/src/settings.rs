//! Configuration loading: YAML file plus `NFCBRIDGE_`-prefixed environment
//! overrides (`NFCBRIDGE__MQTT__HOST` and friends).

use config::{Config, ConfigError, Environment, File};
use nfcbridge_core::config::BridgeConfig;
use std::path::Path;

pub fn load(path: &Path) -> Result<BridgeConfig, ConfigError> {
    Config::builder()
        .add_source(File::from(path))
        .add_source(Environment::with_prefix("NFCBRIDGE").separator("__"))
        .build()?
        .try_deserialize()
}
