//! Shutdown coordinator
//!
//! One-shot state machine `Idle -> ShuttingDown`. The first request sends
//! SIGTERM to every active task and arms one graceful timer per task; later
//! requests are no-ops. A timer that fires while its task is still active
//! escalates to SIGKILL.

use crate::event::{EventSender, SupervisorEvent};
use crate::log::LogSink;
use crate::registry::Registry;
use herd_foundation::{LogRecord, Severity};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// What triggered the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// Interrupt delivered to the supervisor
    Interrupt,
    /// Task `index` failed with fail-fast enabled
    FailFast { index: usize },
}

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Idle,
    ShuttingDown(ShutdownReason),
}

/// Two-phase shutdown: graceful terminate, then timed forceful kill
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: ShutdownState,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: ShutdownState::Idle,
            timeout,
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        match self.state {
            ShutdownState::Idle => None,
            ShutdownState::ShuttingDown(reason) => Some(reason),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start shutdown. Returns `false` if a shutdown was already requested.
    ///
    /// For every active task the terminate signal is sent before its timer is
    /// armed. Tasks without a process (launch still pending) get neither.
    pub fn request(
        &mut self,
        reason: ShutdownReason,
        registry: &mut Registry,
        events: &EventSender,
        sink: &dyn LogSink,
    ) -> bool {
        if let ShutdownState::ShuttingDown(first) = self.state {
            debug!("Shutdown already in progress ({:?}), ignoring {:?}", first, reason);
            return false;
        }
        self.state = ShutdownState::ShuttingDown(reason);
        sink.record(LogRecord::system(Severity::Info, "shutdown..."));

        for task in registry.active_mut() {
            match task.terminate() {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Task {} has no process yet, nothing to terminate", task.tag());
                    continue;
                }
                Err(e) => warn!("Graceful terminate of task {} failed: {}", task.tag(), e),
            }
            task.arm_timer(arm_timer(task.index(), self.timeout, events.clone()));
        }
        true
    }

    /// Handle a fired graceful timer. Returns whether a kill was sent.
    pub fn escalate(&self, index: usize, registry: &mut Registry, sink: &dyn LogSink) -> bool {
        let Some(task) = registry.task_mut(index) else {
            debug!("Graceful timer of task {} fired after termination", index);
            return false;
        };
        if task.take_timer().is_none() {
            debug!("Stale graceful timer for task {}", index);
            return false;
        }

        sink.record(LogRecord::task(
            task.tag(),
            Severity::Error,
            format!("task {} graceful timeout reached - terminating", task.tag()),
        ));
        if let Err(e) = task.kill() {
            warn!("Forceful kill of task {} failed: {}", task.tag(), e);
        }
        true
    }
}

/// Timer that reports `GraceExpired` after `timeout`
fn arm_timer(index: usize, timeout: Duration, events: EventSender) -> AbortHandle {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let _ = events.send(SupervisorEvent::GraceExpired { index });
    })
    .abort_handle()
}
