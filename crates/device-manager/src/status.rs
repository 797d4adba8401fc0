//! Status reported upward to the node agent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a device manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    Starting,
    Running,
    Stopped,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Starting => "STARTING",
            DeviceState::Running => "RUNNING",
            DeviceState::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Status of the REST server device.
///
/// `state` is the device manager's own state; `is_alive` is the result of a
/// liveness probe of the server process at the time of the status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestServerStatus {
    pub state: DeviceState,
    #[serde(rename = "isAlive")]
    pub is_alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_node_agent_field_names() {
        let status = RestServerStatus {
            state: DeviceState::Running,
            is_alive: false,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"state":"RUNNING","isAlive":false}"#);
    }
}
