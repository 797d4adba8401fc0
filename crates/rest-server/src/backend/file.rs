//! Backend reading a JSON cluster document from disk.
//!
//! The document is re-read on every call so edits made by the cluster tooling
//! are picked up without restarting the server.
//!
//! ```json
//! { "nodes": [ { "name": "node1", "address": "tcp://10.0.0.1:5000", "role": "ACTIVE",
//!                "state": "RUNNING", "devices": { ... } } ] }
//! ```

use std::path::PathBuf;

use common::node::NodeInfo;
use serde::Deserialize;

use super::{shape, BackendError, ConfigurationBackend};

#[derive(Debug, Deserialize)]
struct ClusterDocument {
    #[serde(default)]
    nodes: Vec<NodeInfo>,
}

/// File-backed configuration store.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<ClusterDocument, BackendError> {
        let raw = std::fs::read(&self.path).map_err(|source| BackendError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| BackendError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigurationBackend for FileBackend {
    fn node_names(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.load()?.nodes.into_iter().map(|n| n.name).collect())
    }

    fn node(
        &self,
        name: &str,
        include_devices: bool,
        flat_device_hierarchy: bool,
    ) -> Result<Option<NodeInfo>, BackendError> {
        Ok(self
            .load()?
            .nodes
            .into_iter()
            .find(|n| n.name == name)
            .map(|n| shape(n, include_devices, flat_device_hierarchy)))
    }
}
