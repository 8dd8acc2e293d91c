//! Task definition and outcomes

use crate::executor::ProcessHandle;
use crate::state::TaskState;
use herd_foundation::{Result, TaskTag};
use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;

/// How a child's run ended, as reported by the process layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReport {
    /// Exit status code, absent when killed by a signal
    pub code: Option<i32>,
    /// Name of the terminating signal (`SIGTERM`, `SIGKILL`, ...)
    pub signal: Option<String>,
}

impl ExitReport {
    /// Normal exit with `code`
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Termination by the named signal
    pub fn signaled(signal: impl Into<String>) -> Self {
        Self {
            code: None,
            signal: Some(signal.into()),
        }
    }
}

/// Terminal outcome of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// Exited with status 0
    ExitedClean,
    /// Exited with a nonzero status
    ExitedFailed(i32),
    /// Terminated by a signal
    KilledBySignal(String),
    /// The OS process could not be created
    LaunchFailed(String),
}

impl TaskOutcome {
    /// Classify an exit report. A report with neither code nor signal counts
    /// as a failed exit with code -1.
    pub fn from_exit(report: &ExitReport) -> Self {
        match (&report.signal, report.code) {
            (Some(signal), _) => TaskOutcome::KilledBySignal(signal.clone()),
            (None, Some(0)) => TaskOutcome::ExitedClean,
            (None, Some(code)) => TaskOutcome::ExitedFailed(code),
            (None, None) => TaskOutcome::ExitedFailed(-1),
        }
    }

    /// Whether this outcome may bring the whole group down under fail-fast.
    /// Signal termination never does.
    pub fn triggers_fail_fast(&self) -> bool {
        matches!(
            self,
            TaskOutcome::ExitedFailed(_) | TaskOutcome::LaunchFailed(_)
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::ExitedClean)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskOutcome::ExitedClean => "ExitedClean",
            TaskOutcome::ExitedFailed(_) => "ExitedFailed",
            TaskOutcome::KilledBySignal(_) => "KilledBySignal",
            TaskOutcome::LaunchFailed(_) => "LaunchFailed",
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::ExitedClean => write!(f, "exited with code 0"),
            TaskOutcome::ExitedFailed(code) => write!(f, "exited with code {}", code),
            TaskOutcome::KilledBySignal(signal) => write!(f, "closed by signal {}", signal),
            TaskOutcome::LaunchFailed(error) => write!(f, "failed: {}", error),
        }
    }
}

/// One supervised replica
///
/// Owns its process handle exclusively; the handle is released together with
/// the task when the registry records a terminal outcome.
pub struct Task {
    index: usize,
    tag: TaskTag,
    handle: Option<Box<dyn ProcessHandle>>,
    state: TaskState,
    graceful_timer: Option<AbortHandle>,
}

impl Task {
    /// A task whose process was started
    pub fn running(index: usize, tag: TaskTag, handle: Box<dyn ProcessHandle>) -> Self {
        Self {
            index,
            tag,
            handle: Some(handle),
            state: TaskState::Running,
            graceful_timer: None,
        }
    }

    /// A task still waiting for its launch result (no process handle)
    pub fn launching(index: usize, tag: TaskTag) -> Self {
        Self {
            index,
            tag,
            handle: None,
            state: TaskState::Launching,
            graceful_timer: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tag(&self) -> TaskTag {
        self.tag
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().and_then(|h| h.pid())
    }

    /// Whether a process exists that can receive signals
    pub fn has_process(&self) -> bool {
        self.handle.is_some()
    }

    /// Send the graceful-terminate signal. Returns `false` if there is no
    /// process to signal.
    pub fn terminate(&mut self) -> Result<bool> {
        match self.handle.as_mut() {
            Some(handle) => handle.terminate().map(|_| true),
            None => Ok(false),
        }
    }

    /// Send the forceful-kill signal. Returns `false` if there is no process.
    pub fn kill(&mut self) -> Result<bool> {
        match self.handle.as_mut() {
            Some(handle) => handle.kill().map(|_| true),
            None => Ok(false),
        }
    }

    // ========================================================================
    // Graceful timer
    // ========================================================================

    /// Attach the escalation timer of the current shutdown cycle
    pub fn arm_timer(&mut self, timer: AbortHandle) {
        if let Some(previous) = self.graceful_timer.replace(timer) {
            previous.abort();
        }
    }

    pub fn is_timer_armed(&self) -> bool {
        self.graceful_timer.is_some()
    }

    /// Detach the timer without aborting it (it has already fired)
    pub fn take_timer(&mut self) -> Option<AbortHandle> {
        self.graceful_timer.take()
    }

    /// Abort the armed timer, if any. Returns whether one was armed.
    pub fn cancel_timer(&mut self) -> bool {
        match self.graceful_timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("index", &self.index)
            .field("pid", &self.pid())
            .field("state", &self.state)
            .field("timer_armed", &self.is_timer_armed())
            .finish()
    }
}
