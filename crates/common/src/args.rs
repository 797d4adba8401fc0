//! Arguments handed from the device manager to a REST server process.
//!
//! The device manager passes them as environment variables; the server reads
//! them back with the `config` crate using the same prefix and separator.
//! Keeping both directions here means the two binaries cannot drift apart.

use crate::ssl::SslOptions;

/// Prefix of every environment variable read by the REST server.
pub const ENV_PREFIX: &str = "REST";

/// Separator between nested keys, e.g. `REST_SSL_OPTIONS__CERTFILE`.
pub const ENV_SEPARATOR: &str = "__";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8888;

/// Arguments for one REST server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerArgs {
    pub node: String,
    pub port: Option<u16>,
    pub ssl_options: Option<SslOptions>,
}

impl ServerArgs {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: None,
            ssl_options: None,
        }
    }

    /// Port the server will bind.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Render the arguments as `(name, value)` environment variable pairs.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut vars = vec![(env_key(&["NODE"]), self.node.clone())];
        if let Some(port) = self.port {
            vars.push((env_key(&["PORT"]), port.to_string()));
        }
        if let Some(ssl) = &self.ssl_options {
            let fields = [
                ("PACKAGE", &ssl.package),
                ("DIRECTORY", &ssl.directory),
                ("CERTFILE", &ssl.certfile),
                ("KEYFILE", &ssl.keyfile),
                ("PROTOCOL_VERSION", &ssl.protocol_version),
            ];
            for (name, value) in fields {
                if let Some(value) = value {
                    vars.push((env_key(&["SSL_OPTIONS", name]), value.clone()));
                }
            }
        }
        vars
    }
}

/// Whether `key` carries a per-start argument written by [`ServerArgs::to_env`].
///
/// Other `REST_*` variables (backend path, resource root, worker threads,
/// logging) are process-wide server settings and not part of the arguments.
pub fn is_server_arg_key(key: &str) -> bool {
    key == env_key(&["NODE"])
        || key == env_key(&["PORT"])
        || key.starts_with(&format!("{}{ENV_SEPARATOR}", env_key(&["SSL_OPTIONS"])))
}

/// Build a fully-qualified variable name from its nested key segments.
pub fn env_key(segments: &[&str]) -> String {
    format!("{ENV_PREFIX}_{}", segments.join(ENV_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_arg_keys_are_only_per_start_arguments() {
        assert!(is_server_arg_key("REST_NODE"));
        assert!(is_server_arg_key("REST_PORT"));
        assert!(is_server_arg_key("REST_SSL_OPTIONS__CERTFILE"));
        assert!(is_server_arg_key("REST_SSL_OPTIONS__PROTOCOL_VERSION"));
        assert!(!is_server_arg_key("REST_BACKEND_PATH"));
        assert!(!is_server_arg_key("REST_RESOURCE_ROOT"));
        assert!(!is_server_arg_key("REST_WORKER_THREADS"));
        assert!(!is_server_arg_key("REST_LOG_LEVEL"));
        assert!(!is_server_arg_key("REST_NODE_EXTRA"));
    }

    #[test]
    fn node_only() {
        let args = ServerArgs::new("node1");
        assert_eq!(args.to_env(), vec![("REST_NODE".into(), "node1".into())]);
        assert_eq!(args.effective_port(), 8888);
    }

    #[test]
    fn port_and_ssl_options() {
        let args = ServerArgs {
            node: "node1".into(),
            port: Some(9443),
            ssl_options: Some(SslOptions {
                certfile: Some("/etc/c4/cert.pem".into()),
                protocol_version: Some("TLSv1_2".into()),
                ..Default::default()
            }),
        };
        let env = args.to_env();
        assert!(env.contains(&("REST_PORT".into(), "9443".into())));
        assert!(env.contains(&("REST_SSL_OPTIONS__CERTFILE".into(), "/etc/c4/cert.pem".into())));
        assert!(env.contains(&("REST_SSL_OPTIONS__PROTOCOL_VERSION".into(), "TLSv1_2".into())));
        assert!(!env.iter().any(|(k, _)| k == "REST_SSL_OPTIONS__KEYFILE"));
    }
}
