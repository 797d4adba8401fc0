//! Device properties of the REST server device.

use std::path::Path;

use anyhow::{Context, Result};
use common::args::DEFAULT_PORT;
use common::{ServerArgs, SslOptions};
use serde::Deserialize;
use tracing::warn;

/// A port given either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
}

/// Properties configured for the device on the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceProperties {
    #[serde(default)]
    pub port: Option<PortValue>,
    #[serde(default, alias = "sslOptions")]
    pub ssl_options: Option<SslOptions>,
}

impl DeviceProperties {
    /// Read properties from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a properties document.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read device properties {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse device properties {}", path.display()))
    }

    /// The configured port, if it is a valid TCP port.
    ///
    /// Invalid values are logged and ignored so the server falls back to
    /// [`DEFAULT_PORT`].
    pub fn port(&self) -> Option<u16> {
        let port = match self.port.as_ref()? {
            PortValue::Number(n) => u16::try_from(*n).ok(),
            PortValue::Text(s) => s.trim().parse::<u16>().ok(),
        };
        match port {
            Some(p) if p != 0 => Some(p),
            _ => {
                warn!(port = ?self.port, default = DEFAULT_PORT, "invalid port property, using default");
                None
            }
        }
    }

    /// Arguments for a server process on `node`.
    pub fn server_args(&self, node: &str) -> ServerArgs {
        ServerArgs {
            node: node.to_owned(),
            port: self.port(),
            ssl_options: self.ssl_options.clone().filter(|ssl| !ssl.is_empty()),
        }
    }
}
