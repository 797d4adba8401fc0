//! Read-only access to the cluster configuration store.
//!
//! The store itself is owned elsewhere; the server only needs node names and
//! per-node descriptions. Every call may block (file or network I/O), so
//! handlers always go through the [`WorkerPool`](crate::server::pool::WorkerPool).

pub mod file;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use common::node::NodeInfo;
use thiserror::Error;
use tracing::{info, warn};

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Errors produced by a configuration backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to read cluster document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cluster document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Blocking interface to the cluster configuration store.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigurationBackend: Send + Sync {
    /// Names of all configured nodes, in configuration order.
    fn node_names(&self) -> Result<Vec<String>, BackendError>;

    /// Look up one node. `Ok(None)` when no node has that name.
    fn node(
        &self,
        name: &str,
        include_devices: bool,
        flat_device_hierarchy: bool,
    ) -> Result<Option<NodeInfo>, BackendError>;
}

/// Backend handle shared by all handlers of one server process.
pub type SharedBackend = Arc<dyn ConfigurationBackend>;

/// Open the backend selected by `backend_path`.
pub fn open(backend_path: Option<&str>) -> SharedBackend {
    match backend_path {
        Some(path) if !path.trim().is_empty() => {
            info!(path, "using file configuration backend");
            Arc::new(FileBackend::new(path))
        }
        _ => {
            warn!("no REST_BACKEND_PATH configured; serving an empty cluster");
            Arc::new(MemoryBackend::default())
        }
    }
}

/// Apply the device selection flags of [`ConfigurationBackend::node`].
fn shape(node: NodeInfo, include_devices: bool, flat_device_hierarchy: bool) -> NodeInfo {
    if !include_devices {
        node.without_devices()
    } else if flat_device_hierarchy {
        node.with_flat_devices()
    } else {
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::node::{DeviceInfo, Role};

    fn node_with_nested_device() -> NodeInfo {
        let mut disk = DeviceInfo::new("disk", "c4.devices.disk.Disk");
        disk.add_device(DeviceInfo::new("sda", "c4.devices.disk.Partition"));
        let mut node = NodeInfo::new("node1", "tcp://127.0.0.1:5000", Role::Active);
        node.add_device(disk);
        node
    }

    #[test]
    fn shape_drops_devices() {
        assert!(shape(node_with_nested_device(), false, true).devices.is_empty());
    }

    #[test]
    fn shape_flattens_on_request() {
        let node = shape(node_with_nested_device(), true, true);
        assert!(node.devices.contains_key("disk.sda"));
        let node = shape(node_with_nested_device(), true, false);
        assert!(node.devices["disk"].devices.contains_key("sda"));
    }

    #[test]
    fn open_without_path_is_empty() {
        let backend = open(None);
        assert!(backend.node_names().unwrap().is_empty());
        let backend = open(Some("  "));
        assert!(backend.node_names().unwrap().is_empty());
    }
}
