//! Device manager lifecycle contract with the node agent.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::status::DeviceState;

/// Lifecycle messages delivered by the node agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleMessage {
    LocalStartDeviceManager {
        #[serde(default, rename = "isRecovery")]
        is_recovery: bool,
    },
    LocalStopDeviceManager,
}

/// Acknowledgement returned for a lifecycle message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleReply {
    pub device: String,
    pub state: DeviceState,
}

/// Base bookkeeping shared by every device manager.
pub fn acknowledge(device: &str, message: LifecycleMessage, state: DeviceState) -> LifecycleReply {
    info!(device, ?message, %state, "lifecycle message handled");
    LifecycleReply {
        device: device.to_owned(),
        state,
    }
}

/// A device manager hosted by the node agent.
///
/// Implementations never return errors: failures are logged and show up in
/// [`DeviceManager::state`] and the status object.
pub trait DeviceManager {
    type Status: Serialize;

    fn name(&self) -> &str;

    fn state(&self) -> DeviceState;

    fn start(&mut self, is_recovery: bool);

    fn stop(&mut self);

    fn handle_status(&mut self) -> Self::Status;

    fn handle_local_start_device_manager(&mut self, is_recovery: bool) -> LifecycleReply {
        self.start(is_recovery);
        acknowledge(
            self.name(),
            LifecycleMessage::LocalStartDeviceManager { is_recovery },
            self.state(),
        )
    }

    fn handle_local_stop_device_manager(&mut self) -> LifecycleReply {
        self.stop();
        acknowledge(
            self.name(),
            LifecycleMessage::LocalStopDeviceManager,
            self.state(),
        )
    }

    fn handle_message(&mut self, message: LifecycleMessage) -> LifecycleReply {
        match message {
            LifecycleMessage::LocalStartDeviceManager { is_recovery } => {
                self.handle_local_start_device_manager(is_recovery)
            }
            LifecycleMessage::LocalStopDeviceManager => self.handle_local_stop_device_manager(),
        }
    }
}
