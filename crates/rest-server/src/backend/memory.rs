//! In-memory backend, used when no cluster document is configured and in tests.

use std::sync::RwLock;

use common::node::NodeInfo;

use super::{shape, BackendError, ConfigurationBackend};

/// Backend holding nodes in insertion order.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    nodes: RwLock<Vec<NodeInfo>>,
}

impl MemoryBackend {
    pub fn new(nodes: Vec<NodeInfo>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Add a node, replacing any existing node of the same name in place.
    pub fn add_node(&self, node: NodeInfo) {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        match nodes.iter_mut().find(|n| n.name == node.name) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
    }
}

impl ConfigurationBackend for MemoryBackend {
    fn node_names(&self) -> Result<Vec<String>, BackendError> {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        Ok(nodes.iter().map(|n| n.name.clone()).collect())
    }

    fn node(
        &self,
        name: &str,
        include_devices: bool,
        flat_device_hierarchy: bool,
    ) -> Result<Option<NodeInfo>, BackendError> {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        Ok(nodes
            .iter()
            .find(|n| n.name == name)
            .cloned()
            .map(|n| shape(n, include_devices, flat_device_hierarchy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::node::Role;

    #[test]
    fn add_node_replaces_same_name() {
        let backend = MemoryBackend::default();
        backend.add_node(NodeInfo::new("node1", "tcp://127.0.0.1:5000", Role::Thin));
        backend.add_node(NodeInfo::new("node2", "tcp://127.0.0.1:6000", Role::Passive));
        backend.add_node(NodeInfo::new("node1", "tcp://127.0.0.1:5000", Role::Active));

        assert_eq!(backend.node_names().unwrap(), vec!["node1", "node2"]);
        let node1 = backend.node("node1", true, false).unwrap().unwrap();
        assert_eq!(node1.role, Role::Active);
    }

    #[test]
    fn unknown_node_is_none() {
        let backend = MemoryBackend::default();
        assert!(backend.node("missing", false, false).unwrap().is_none());
    }
}
