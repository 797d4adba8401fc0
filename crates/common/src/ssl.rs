//! SSL options as supplied in the device properties.

use serde::{Deserialize, Serialize};

/// Unvalidated SSL options for the REST server.
///
/// Every field is optional here. Whether TLS can actually be enabled is decided
/// by the server at startup, which checks that the files exist and that a
/// protocol version was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslOptions {
    /// Resource package the certificate and key are shipped in.
    #[serde(default)]
    pub package: Option<String>,
    /// Directory prefix inside `package`, concatenated verbatim with the file name.
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub certfile: Option<String>,
    #[serde(default)]
    pub keyfile: Option<String>,
    /// e.g. `"TLSv1_2"`.
    #[serde(default, rename = "protocolVersion", alias = "protocol_version")]
    pub protocol_version: Option<String>,
}

impl SslOptions {
    /// `true` when no field carries a value.
    pub fn is_empty(&self) -> bool {
        [
            &self.package,
            &self.directory,
            &self.certfile,
            &self.keyfile,
            &self.protocol_version,
        ]
        .iter()
        .all(|field| field.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}
