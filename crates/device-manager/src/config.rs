//! Configuration loading and validation for the `rest-device` driver.
//!
//! Values come from `DEVICE_`-prefixed environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapter::DEFAULT_STOP_TIMEOUT;

const ENV_PREFIX: &str = "DEVICE";

/// Validated `rest-device` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Device name reported to the node agent.
    #[serde(default = "default_name")]
    pub name: String,

    /// Node the REST server serves. **Required.**
    pub node: String,

    /// Path of the `rest-server` executable.
    #[serde(default = "default_server_binary")]
    pub server_binary: PathBuf,

    /// JSON document with the device properties (`port`, `ssl_options`).
    #[serde(default)]
    pub properties_file: Option<PathBuf>,

    /// Seconds `stop` waits before killing the server; `0` waits forever.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_name() -> String {
    "rest".into()
}
fn default_server_binary() -> PathBuf {
    PathBuf::from("rest-server")
}
fn default_stop_timeout_secs() -> u64 {
    DEFAULT_STOP_TIMEOUT.as_secs()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DEVICE_NODE` is absent or any value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(environment())
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build rest-device configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise rest-device configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.node.trim().is_empty() {
            anyhow::bail!("DEVICE_NODE is required and must not be empty");
        }
        if self.name.trim().is_empty() {
            anyhow::bail!("DEVICE_NAME must not be empty");
        }
        Ok(())
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        match self.stop_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .try_parsing(true)
}
