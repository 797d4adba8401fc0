//! The REST server device: starts, stops and probes the REST server process.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::lifecycle::DeviceManager;
use crate::monitor::{LogMonitor, Monitor, MonitorOutcome};
use crate::process::{ServerCommand, ServerProcessHandle};
use crate::properties::DeviceProperties;
use crate::status::{DeviceState, RestServerStatus};

/// How long `stop` waits for the process before killing it.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Device manager owning at most one REST server process.
pub struct RestServerDevice {
    name: String,
    node: String,
    properties: DeviceProperties,
    command: ServerCommand,
    stop_timeout: Option<Duration>,
    monitor: Box<dyn Monitor>,
    state: DeviceState,
    process: Option<ServerProcessHandle>,
}

impl RestServerDevice {
    pub fn new(
        name: impl Into<String>,
        node: impl Into<String>,
        properties: DeviceProperties,
        command: ServerCommand,
    ) -> Self {
        Self {
            name: name.into(),
            node: node.into(),
            properties,
            command,
            stop_timeout: Some(DEFAULT_STOP_TIMEOUT),
            monitor: Box::new(LogMonitor),
            state: DeviceState::Stopped,
            process: None,
        }
    }

    /// Bound the wait in `stop`. `None` waits until the process exits.
    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn with_monitor(mut self, monitor: Box<dyn Monitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// PID of the current server process, alive or not.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(ServerProcessHandle::pid)
    }

    fn is_alive(&mut self) -> bool {
        self.process.as_mut().is_some_and(ServerProcessHandle::is_alive)
    }

    /// Terminate the process held by `handle` and wait for it.
    fn shut_down(&self, mut handle: ServerProcessHandle) {
        let pid = handle.pid();
        if let Err(e) = handle.terminate() {
            error!(device = %self.name, pid, error = %e, "failed to terminate REST server");
        }
        match handle.join(self.stop_timeout) {
            Ok(status) => info!(device = %self.name, pid, %status, "REST server stopped"),
            Err(e) => error!(device = %self.name, pid, error = %e, "failed to wait for REST server"),
        }
    }

    /// Reap a handle whose process has already exited.
    fn discard_dead(&mut self) {
        if let Some(mut handle) = self.process.take() {
            if let Err(e) = handle.join(self.stop_timeout) {
                warn!(device = %self.name, pid = handle.pid(), error = %e, "failed to reap REST server");
            }
        }
    }
}

impl DeviceManager for RestServerDevice {
    type Status = RestServerStatus;

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn start(&mut self, is_recovery: bool) {
        if self.state == DeviceState::Starting {
            info!(device = %self.name, "start already in progress");
            return;
        }
        if self.is_alive() {
            info!(device = %self.name, pid = ?self.pid(), "REST server already started");
            self.state = DeviceState::Running;
            return;
        }

        self.state = DeviceState::Starting;
        self.discard_dead();

        let args = self.properties.server_args(&self.node);
        match ServerProcessHandle::spawn(&self.command, args) {
            Ok(handle) => self.process = Some(handle),
            Err(e) => error!(device = %self.name, error = %e, "failed to start REST server"),
        }
        self.state = DeviceState::Running;

        if is_recovery {
            let outcome = if self.is_alive() {
                MonitorOutcome::Success
            } else {
                MonitorOutcome::Failure
            };
            self.monitor.report(&self.name, outcome);
        }
    }

    fn stop(&mut self) {
        if self.is_alive() {
            if let Some(handle) = self.process.take() {
                self.shut_down(handle);
            }
        } else {
            info!(device = %self.name, "REST server not running, nothing to stop");
        }
        self.state = DeviceState::Stopped;
    }

    fn handle_status(&mut self) -> RestServerStatus {
        RestServerStatus {
            state: self.state,
            is_alive: self.is_alive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MockMonitor;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::thread;

    fn device() -> RestServerDevice {
        RestServerDevice::new(
            "rest",
            "node1",
            DeviceProperties::default(),
            ServerCommand::new("sleep").arg("30"),
        )
    }

    fn wait_until_dead(device: &mut RestServerDevice) {
        for _ in 0..100 {
            if !device.handle_status().is_alive {
                return;
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("process still alive");
    }

    #[test]
    fn start_runs_one_process() {
        let mut device = device();
        assert_eq!(device.state(), DeviceState::Stopped);

        device.start(false);
        let pid = device.pid().unwrap();
        assert_eq!(
            device.handle_status(),
            RestServerStatus { state: DeviceState::Running, is_alive: true }
        );

        device.start(false);
        assert_eq!(device.pid(), Some(pid));
        assert_eq!(device.state(), DeviceState::Running);

        device.stop();
        assert_eq!(
            device.handle_status(),
            RestServerStatus { state: DeviceState::Stopped, is_alive: false }
        );
        assert!(device.pid().is_none());
    }

    #[test]
    fn stop_without_process_is_noop() {
        let mut device = device();
        device.stop();
        device.stop();
        assert!(!device.handle_status().is_alive);
        assert!(device.pid().is_none());
    }

    #[test]
    fn external_kill_is_seen_and_restart_replaces_handle() {
        let mut device = device();
        device.start(false);
        let pid = device.pid().unwrap();

        kill(Pid::from_raw(pid as i32), Signal::SIGKILL).unwrap();
        wait_until_dead(&mut device);
        assert_eq!(device.state(), DeviceState::Running);

        // A dead handle survives stop and is replaced by the next start.
        device.stop();
        assert_eq!(device.pid(), Some(pid));

        device.start(false);
        let new_pid = device.pid().unwrap();
        assert_ne!(new_pid, pid);
        assert!(device.handle_status().is_alive);
        device.stop();
    }

    #[test]
    fn spawn_failure_leaves_device_not_alive() {
        let mut device = RestServerDevice::new(
            "rest",
            "node1",
            DeviceProperties::default(),
            ServerCommand::new("/nonexistent/rest-server"),
        );
        device.start(false);
        assert_eq!(
            device.handle_status(),
            RestServerStatus { state: DeviceState::Running, is_alive: false }
        );
    }

    #[test]
    fn recovery_reports_success() {
        let mut monitor = MockMonitor::new();
        monitor
            .expect_report()
            .withf(|device, outcome| device == "rest" && *outcome == MonitorOutcome::Success)
            .times(1)
            .return_const(());
        let mut device = device().with_monitor(Box::new(monitor));
        device.start(true);
        device.stop();
    }

    #[test]
    fn recovery_reports_failure_when_spawn_fails() {
        let mut monitor = MockMonitor::new();
        monitor
            .expect_report()
            .withf(|_, outcome| *outcome == MonitorOutcome::Failure)
            .times(1)
            .return_const(());
        let mut device = RestServerDevice::new(
            "rest",
            "node1",
            DeviceProperties::default(),
            ServerCommand::new("/nonexistent/rest-server"),
        )
        .with_monitor(Box::new(monitor));
        device.start(true);
    }

    #[test]
    fn non_recovery_start_does_not_report() {
        let mut monitor = MockMonitor::new();
        monitor.expect_report().times(0);
        let mut device = device().with_monitor(Box::new(monitor));
        device.start(false);
        device.stop();
    }

    #[test]
    fn stop_kills_process_ignoring_sigterm() {
        let mut device = RestServerDevice::new(
            "rest",
            "node1",
            DeviceProperties::default(),
            ServerCommand::new("sh").arg("-c").arg("trap '' TERM; exec sleep 30"),
        )
        .with_stop_timeout(Some(Duration::from_millis(300)));
        device.start(false);
        thread::sleep(Duration::from_millis(200));

        device.stop();
        assert_eq!(
            device.handle_status(),
            RestServerStatus { state: DeviceState::Stopped, is_alive: false }
        );
    }

    #[test]
    fn lifecycle_messages_drive_the_process() {
        let mut device = device();
        let reply = device.handle_local_start_device_manager(false);
        assert_eq!(reply.state, DeviceState::Running);
        assert!(device.handle_status().is_alive);

        let reply = device.handle_local_stop_device_manager();
        assert_eq!(reply.state, DeviceState::Stopped);
        assert!(!device.handle_status().is_alive);
    }
}
