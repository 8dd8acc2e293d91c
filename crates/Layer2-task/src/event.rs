//! Supervisor event queue
//!
//! Every source of concurrency (child exit watchers, output readers, graceful
//! timers, OS interrupts) talks to the supervisor through one unbounded
//! channel. The supervisor drains it on a single control flow, so the
//! registry and the shutdown flag have exactly one writer.

use crate::task::ExitReport;
use herd_foundation::StreamKind;
use tokio::sync::mpsc;

/// Events consumed by the supervisor loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A launched child exited (normally or by signal)
    Exited { index: usize, report: ExitReport },

    /// A child could not be started
    LaunchFailed { index: usize, error: String },

    /// One line of child output
    Line {
        index: usize,
        stream: StreamKind,
        line: String,
    },

    /// An output stream reached end-of-file
    StreamClosed { index: usize, stream: StreamKind },

    /// A graceful timer fired
    GraceExpired { index: usize },

    /// Interrupt delivered to the supervisor
    Interrupt,
}

pub type EventSender = mpsc::UnboundedSender<SupervisorEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SupervisorEvent>;

/// Create the supervisor event channel
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
