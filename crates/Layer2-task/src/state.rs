//! Task state machine

use crate::task::TaskOutcome;
use serde::{Deserialize, Serialize};

/// Lifecycle of a task: `Launching -> Running -> Terminated`
///
/// A task reaches `Terminated` at most once. `LaunchFailed` is only reachable
/// from `Launching`; exit outcomes only from `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Spawn requested, no process handle
    Launching,

    /// Process started
    Running,

    /// Finished with an outcome
    Terminated(TaskOutcome),
}

impl TaskState {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Terminated(_))
    }

    /// Check if task is currently running
    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }

    /// Whether `outcome` is a legal terminal transition from this state
    pub fn accepts(&self, outcome: &TaskOutcome) -> bool {
        match self {
            TaskState::Launching => matches!(outcome, TaskOutcome::LaunchFailed(_)),
            TaskState::Running => !matches!(outcome, TaskOutcome::LaunchFailed(_)),
            TaskState::Terminated(_) => false,
        }
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskState::Launching => "Launching",
            TaskState::Running => "Running",
            TaskState::Terminated(_) => "Terminated",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
