//! Monitoring signal emitted when a device is restarted during recovery.

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonitorOutcome {
    Success,
    Failure,
}

/// Sink for recovery outcomes.
#[cfg_attr(test, mockall::automock)]
pub trait Monitor: Send {
    fn report(&self, device: &str, outcome: MonitorOutcome);
}

/// Monitor that records outcomes in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMonitor;

impl Monitor for LogMonitor {
    fn report(&self, device: &str, outcome: MonitorOutcome) {
        match outcome {
            MonitorOutcome::Success => info!(device, outcome = ?outcome, "recovery succeeded"),
            MonitorOutcome::Failure => warn!(device, outcome = ?outcome, "recovery failed"),
        }
    }
}
