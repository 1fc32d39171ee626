// src/config.rs

//! Client configuration: defaults, TOML loading and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Timeout used for connecting, reading and writing when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a single Pub/Sub connection.
///
/// Durations are written in humantime form in TOML, e.g. `read_timeout = "5s"`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Broker address in `host:port` form.
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub connect_timeout: Duration,

    /// How long a single read may idle before it is retried. This only keeps
    /// the reader responsive; an idle connection is never treated as broken.
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub read_timeout: Duration,

    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub write_timeout: Duration,
}

fn default_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// A config for `address` with every timeout at `DEFAULT_TIMEOUT`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Uses `timeout` for connecting, reading and writing.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.read_timeout = timeout;
        self.write_timeout = timeout;
        self
    }

    /// Loads and validates a config from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config from '{path}'"))
    }

    /// Parses and validates a config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(contents).context("Failed to parse client config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(anyhow!("address cannot be empty"));
        }
        // A zero read timeout would turn the idle-read retry into a busy loop.
        for (name, value) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
        ] {
            if value.is_zero() {
                return Err(anyhow!("{name} cannot be 0"));
            }
        }
        Ok(())
    }
}
