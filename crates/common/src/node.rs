//! Cluster node and device descriptions read from the configuration backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Role a node plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Active,
    Passive,
    Thin,
    Disabled,
}

/// Lifecycle state of a node or device as recorded by the configuration backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeState {
    Deployed,
    Maintenance,
    Registered,
    Repair,
    Running,
    Starting,
    Stopping,
    Undeployed,
}

fn default_role() -> Role {
    Role::Thin
}
fn default_node_state() -> NodeState {
    NodeState::Deployed
}
fn default_device_state() -> NodeState {
    NodeState::Registered
}

/// A device manager hosted on a node. Devices may contain child devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default = "default_device_state")]
    pub state: NodeState,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceInfo>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_type: device_type.into(),
            state: default_device_state(),
            properties: BTreeMap::new(),
            devices: BTreeMap::new(),
        }
    }

    /// Add (or replace) a child device, keyed by its name.
    pub fn add_device(&mut self, device: DeviceInfo) {
        self.devices.insert(device.name.clone(), device);
    }

    /// Move this device and all descendants into `out`, keyed by dotted path.
    fn flatten_into(mut self, prefix: Option<&str>, out: &mut BTreeMap<String, DeviceInfo>) {
        let path = match prefix {
            Some(p) => format!("{p}.{}", self.name),
            None => self.name.clone(),
        };
        let children = std::mem::take(&mut self.devices);
        for (_, child) in children {
            child.flatten_into(Some(&path), out);
        }
        self.name = path.clone();
        out.insert(path, self);
    }
}

/// Description of one cluster node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub address: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default = "default_node_state")]
    pub state: NodeState,
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceInfo>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            role,
            state: default_node_state(),
            devices: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style state override.
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Add (or replace) a top-level device, keyed by its name.
    pub fn add_device(&mut self, device: DeviceInfo) {
        self.devices.insert(device.name.clone(), device);
    }

    /// Drop all device information.
    pub fn without_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    /// Replace the device tree with a single level keyed by dotted path,
    /// e.g. `disk` with child `sda` becomes `disk` and `disk.sda`.
    pub fn with_flat_devices(mut self) -> Self {
        let tree = std::mem::take(&mut self.devices);
        let mut flat = BTreeMap::new();
        for (_, device) in tree {
            device.flatten_into(None, &mut flat);
        }
        self.devices = flat;
        self
    }
}
