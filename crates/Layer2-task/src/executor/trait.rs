//! Launcher and process handle traits

use crate::event::EventSender;
use crate::executor::LaunchSpec;
use herd_foundation::Result;

/// Signal surface of one running child
pub trait ProcessHandle: Send {
    /// OS process id, if known
    fn pid(&self) -> Option<u32>;

    /// Ask the process to stop (SIGTERM)
    fn terminate(&mut self) -> Result<()>;

    /// Stop the process unconditionally (SIGKILL)
    fn kill(&mut self) -> Result<()>;
}

/// A successfully started child
pub struct Spawned {
    pub handle: Box<dyn ProcessHandle>,
    /// Number of output streams that will each end with `StreamClosed`
    pub output_streams: usize,
}

/// Launcher trait - implement to add new process backends
///
/// `spawn` must not block. Exit, output and stream-close notifications are
/// delivered later through `events`.
pub trait Launcher: Send {
    /// Start one child for `spec`
    fn spawn(&self, spec: &LaunchSpec, events: &EventSender) -> Result<Spawned>;

    /// Get launcher name
    fn name(&self) -> &'static str;
}
