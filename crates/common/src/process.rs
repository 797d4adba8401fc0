//! Lifecycle state of a supervised REST server process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of one REST server OS process.
///
/// Transitions only move forward: `NotStarted → Running → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    NotStarted,
    Running,
    Terminated,
}

impl ProcessState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        matches!(
            (self, next),
            (ProcessState::NotStarted, ProcessState::Running)
                | (ProcessState::NotStarted, ProcessState::Terminated)
                | (ProcessState::Running, ProcessState::Terminated)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::NotStarted => "NOT_STARTED",
            ProcessState::Running => "RUNNING",
            ProcessState::Terminated => "TERMINATED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        assert!(ProcessState::NotStarted.can_transition_to(ProcessState::Running));
        assert!(ProcessState::Running.can_transition_to(ProcessState::Terminated));
        assert!(ProcessState::NotStarted.can_transition_to(ProcessState::Terminated));
        assert!(!ProcessState::Terminated.can_transition_to(ProcessState::Running));
        assert!(!ProcessState::Running.can_transition_to(ProcessState::NotStarted));
        assert!(!ProcessState::Running.can_transition_to(ProcessState::Running));
    }
}
