//! # herd-task
//!
//! Replica supervision core for herd.
//! Launches N copies of one command, streams their output, observes their
//! exits and drives a two-phase shutdown.
//!
//! ## Features
//!
//! - Per-replica argument and environment rendering from `{{index}}` templates
//! - Line-oriented stdout/stderr forwarding tagged by replica
//! - Fail-fast on nonzero exit or launch failure
//! - Graceful terminate with per-task timeout escalation to kill
//! - Single event loop owning all supervision state

pub mod event;
pub mod executor;
pub mod log;
pub mod registry;
pub mod shutdown;
pub mod state;
pub mod supervisor;
pub mod task;

// Supervision
pub use event::{EventReceiver, EventSender, SupervisorEvent};
pub use registry::{Registry, Slot};
pub use shutdown::{ShutdownCoordinator, ShutdownReason, ShutdownState};
pub use state::TaskState;
pub use supervisor::{RunReport, Supervisor};
pub use task::{ExitReport, Task, TaskOutcome};

// Launching
pub use executor::{
    launch, LaunchPlan, LaunchSpec, Launched, Launcher, ProcessHandle, ProcessLauncher, Spawned,
};

// Log system
pub use log::{stream_lines, LogSink, TracingSink};
