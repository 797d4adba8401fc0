//! Configuration loading and validation for the REST server process.
//!
//! All values are read from `REST_`-prefixed environment variables at startup,
//! which is how the device manager hands arguments to the process (see
//! [`common::args`]). Nested SSL options use `__` as separator, e.g.
//! `REST_SSL_OPTIONS__CERTFILE`.

use anyhow::{Context, Result};
use common::args::{DEFAULT_PORT, ENV_PREFIX, ENV_SEPARATOR};
use common::SslOptions;
use serde::Deserialize;

/// Validated REST server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the node this server runs on. **Required.**
    pub node: String,

    /// Port the HTTP(S) listener binds.
    #[serde(default = "default_port")]
    pub port: u16,

    /// SSL options from the device properties. TLS is not attempted when absent.
    #[serde(default)]
    pub ssl_options: Option<SslOptions>,

    /// JSON cluster document served by the configuration backend.
    /// An empty in-memory backend is used when unset.
    #[serde(default)]
    pub backend_path: Option<String>,

    /// Directory that resource packages named in `ssl_options.package` live under.
    #[serde(default = "default_resource_root")]
    pub resource_root: String,

    /// Size of the blocking worker pool used for backend calls.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Optional OTLP endpoint; spans are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_resource_root() -> String {
    "/usr/share/c4".into()
}
fn default_worker_threads() -> usize {
    10
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `REST_NODE` is absent or any value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(environment())
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.node, "REST_NODE")?;
        ensure_non_empty(&self.log_level, "REST_LOG_LEVEL")?;
        if self.worker_threads == 0 {
            anyhow::bail!("REST_WORKER_THREADS must be > 0");
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ServerArgs;
    use std::collections::HashMap;

    fn load(vars: Vec<(String, String)>) -> Result<Config> {
        let map: HashMap<String, String> = vars.into_iter().collect();
        Config::from_environment(environment().source(Some(map)))
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_port(), 8888);
        assert_eq!(default_worker_threads(), 10);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn reads_arguments_written_by_device_manager() {
        let args = ServerArgs {
            node: "node1".into(),
            port: Some(9443),
            ssl_options: Some(SslOptions {
                package: Some("c4.rest".into()),
                directory: Some("ssl/".into()),
                certfile: Some("cert.pem".into()),
                keyfile: Some("key.pem".into()),
                protocol_version: Some("TLSv1_2".into()),
            }),
        };
        let cfg = load(args.to_env()).unwrap();
        assert_eq!(cfg.node, "node1");
        assert_eq!(cfg.port, 9443);
        assert_eq!(cfg.ssl_options, args.ssl_options);
    }

    #[test]
    fn ssl_options_absent_when_not_passed() {
        let cfg = load(ServerArgs::new("node2").to_env()).unwrap();
        assert_eq!(cfg.port, 8888);
        assert!(cfg.ssl_options.is_none());
        assert!(cfg.backend_path.is_none());
    }

    #[test]
    fn missing_node_is_rejected() {
        assert!(load(vec![("REST_PORT".into(), "8888".into())]).is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let cfg = Config {
            node: "node1".into(),
            port: default_port(),
            ssl_options: None,
            backend_path: None,
            resource_root: default_resource_root(),
            worker_threads: 0,
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        };
        assert!(cfg.validate().is_err());
    }
}
