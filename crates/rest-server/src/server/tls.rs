//! TLS bootstrap: decide whether the listener can use TLS and build its config.
//!
//! [`resolve_tls`] never fails. Every problem with the configured options is
//! logged in a single pass and downgrades the result to plaintext; only a
//! certificate or key that exists but cannot be parsed is a startup error
//! (raised by [`load_server_config`]).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use common::SslOptions;
use rustls::ServerConfig;
use tracing::{error, info, warn};

/// TLS protocol version the listener is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    Tls12,
    Tls13,
}

impl ProtocolVersion {
    /// Parse a configured version name.
    ///
    /// Accepts the common spellings `TLSv1_2`, `TLSv1.2`, `PROTOCOL_TLSv1_2`
    /// and `TLS1.3`, case-insensitively. Versions rustls does not implement
    /// are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalised: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_uppercase();
        let normalised = normalised.strip_prefix("PROTOCOL").unwrap_or(&normalised);
        match normalised {
            "TLSV12" | "TLS12" => Some(ProtocolVersion::Tls12),
            "TLSV13" | "TLS13" => Some(ProtocolVersion::Tls13),
            _ => None,
        }
    }

    fn rustls_version(self) -> &'static rustls::SupportedProtocolVersion {
        match self {
            ProtocolVersion::Tls12 => &rustls::version::TLS12,
            ProtocolVersion::Tls13 => &rustls::version::TLS13,
        }
    }
}

/// Outcome of TLS resolution.
///
/// When `enabled` is `true` both files exist and `protocol_version` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub enabled: bool,
    pub certificate_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub protocol_version: Option<ProtocolVersion>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve a certificate or key file name.
///
/// A bare file name is looked up inside `package` when one is given:
/// `<resource_root>/<package, dots as slashes>/<directory><file>`. The
/// directory is concatenated verbatim, so it normally ends with `/`.
fn resolve_file(file: &str, package: Option<&str>, directory: &str, resource_root: &Path) -> PathBuf {
    let literal = Path::new(file);
    let has_directory = literal
        .parent()
        .map_or(false, |parent| !parent.as_os_str().is_empty());
    match package {
        Some(package) if !has_directory => resource_root
            .join(package.replace('.', "/"))
            .join(format!("{directory}{file}")),
        _ => literal.to_path_buf(),
    }
}

/// Check that `path` is configured and exists, logging under `what` otherwise.
fn check_file(path: Option<&Path>, what: &str) -> bool {
    match path {
        None => {
            error!("SSL {what} file not specified");
            false
        }
        Some(path) if !path.exists() => {
            error!(path = %path.display(), "SSL {what} file not found");
            false
        }
        Some(_) => true,
    }
}

/// Validate `options` and decide whether TLS can be enabled.
///
/// Without options (or with only blank fields) TLS is simply not attempted.
pub fn resolve_tls(options: Option<&SslOptions>, resource_root: &Path) -> TlsOptions {
    let Some(options) = options.filter(|o| !o.is_empty()) else {
        return TlsOptions::default();
    };

    let package = non_blank(&options.package);
    let directory = options.directory.as_deref().unwrap_or_default();
    let certificate_file =
        non_blank(&options.certfile).map(|f| resolve_file(f, package, directory, resource_root));
    let key_file =
        non_blank(&options.keyfile).map(|f| resolve_file(f, package, directory, resource_root));

    let mut enabled = check_file(certificate_file.as_deref(), "certificate");
    enabled &= check_file(key_file.as_deref(), "key");

    let protocol_version = match non_blank(&options.protocol_version) {
        None => {
            error!("SSL version not specified");
            None
        }
        Some(raw) => {
            let parsed = ProtocolVersion::parse(raw);
            if parsed.is_none() {
                error!(version = raw, "unsupported SSL protocol version");
            }
            parsed
        }
    };
    enabled &= protocol_version.is_some();

    if enabled {
        info!(
            certfile = ?certificate_file,
            keyfile = ?key_file,
            version = ?protocol_version,
            "SSL enabled for REST server"
        );
    } else {
        warn!("SSL options specified but unable to enable SSL for REST server");
    }

    TlsOptions {
        enabled,
        certificate_file,
        key_file,
        protocol_version,
    }
}

/// Read the files named by enabled `tls` options and build the server config.
///
/// # Errors
///
/// Returns an error if `tls` is not enabled, a file cannot be read, or the
/// PEM contents are rejected.
pub fn load_server_config(tls: &TlsOptions) -> Result<Arc<ServerConfig>> {
    let (Some(cert), Some(key), Some(version), true) = (
        tls.certificate_file.as_deref(),
        tls.key_file.as_deref(),
        tls.protocol_version,
        tls.enabled,
    ) else {
        anyhow::bail!("TLS options are not enabled");
    };

    let cert_pem = std::fs::read(cert)
        .with_context(|| format!("failed to read SSL certificate {}", cert.display()))?;
    let key_pem =
        std::fs::read(key).with_context(|| format!("failed to read SSL key {}", key.display()))?;
    build_server_config(&cert_pem, &key_pem, version)
}

/// Build a [`rustls::ServerConfig`] from PEM-encoded certificate chain and key.
///
/// The config accepts only `version` and advertises HTTP/2 and HTTP/1.1.
///
/// # Errors
///
/// Returns an error if the certificate or key cannot be parsed, or if rustls
/// rejects the configuration.
pub fn build_server_config(
    cert_pem: &[u8],
    key_pem: &[u8],
    version: ProtocolVersion,
) -> Result<Arc<ServerConfig>> {
    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to parse TLS certificate chain")?;
    if certs.is_empty() {
        anyhow::bail!("no certificate found in PEM data");
    }

    let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(key_pem))
        .context("failed to read TLS private key")?
        .context("no private key found in PEM data")?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[version.rustls_version()])
        .context("TLS protocol version not supported by crypto provider")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("failed to build rustls ServerConfig")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}
