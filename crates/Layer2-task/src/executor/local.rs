//! Local launcher - runs replicas as host processes
//!
//! Features:
//! - No intermediate shell, so signals reach the child itself
//! - Inherited environment plus the optional rendered override
//! - stdout/stderr forwarded line by line into the event queue
//! - Exit watcher that owns the `Child` and reports code or signal name
//! - SIGTERM for graceful stop, SIGKILL for forceful stop
//!
//! Both signals are delivered by the exit watcher, and only while the child
//! is still unreaped, so a recycled pid is never signalled.

use crate::event::{EventSender, SupervisorEvent};
use crate::executor::{LaunchSpec, Launcher, ProcessHandle, Spawned};
use crate::log::stream_lines;
use crate::task::ExitReport;
use herd_foundation::{Error, Result, StreamKind};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Launcher that starts replicas directly on the host
///
/// Children are killed if their watcher is dropped without observing exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    /// Create a new local launcher
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ProcessLauncher {
    fn spawn(&self, spec: &LaunchSpec, events: &EventSender) -> Result<Spawned> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some((key, value)) = &spec.env {
            cmd.env(key, value);
        }

        debug!("Spawning task {}: {}", spec.index, spec);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::launch(&spec.program, e.to_string()))?;

        let pid = child.id();
        let index = spec.index;
        let mut output_streams = 0;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(stream_lines(index, StreamKind::Stdout, stdout, events.clone()));
            output_streams += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(stream_lines(index, StreamKind::Stderr, stderr, events.clone()));
            output_streams += 1;
        }

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(watch_exit(index, child, control_rx, events.clone()));

        Ok(Spawned {
            handle: Box::new(ChildHandle {
                pid,
                control_tx,
                killed: false,
            }),
            output_streams,
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Stop request forwarded to the exit watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Terminate,
    Kill,
}

/// Wait for the child to exit and report it, applying stop requests from
/// `control_rx` on the way. A closed control channel is ignored.
async fn watch_exit(
    index: usize,
    mut child: Child,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    events: EventSender,
) {
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(request) = control_rx.recv() => apply(index, &mut child, request),
        }
    };

    let report = match status {
        Ok(status) => exit_report(status),
        Err(e) => {
            error!("Failed to wait for task {}: {}", index, e);
            ExitReport {
                code: None,
                signal: None,
            }
        }
    };

    let _ = events.send(SupervisorEvent::Exited { index, report });
}

fn apply(index: usize, child: &mut Child, request: Control) {
    // `id()` is cleared once the child has been reaped
    let Some(pid) = child.id() else {
        debug!("{:?} for task {} after exit, ignoring", request, index);
        return;
    };

    match request {
        #[cfg(unix)]
        Control::Terminate => {
            if let Err(e) = send_signal(pid, nix::sys::signal::Signal::SIGTERM) {
                warn!("Graceful terminate of task {} failed: {}", index, e);
            }
        }
        // No graceful signal outside unix; stop the process outright
        #[cfg(not(unix))]
        Control::Terminate => start_kill(index, pid, child),
        Control::Kill => start_kill(index, pid, child),
    }
}

fn start_kill(index: usize, pid: u32, child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!("Kill of task {} (pid {}) failed: {}", index, pid, e);
    }
}

/// Convert an OS exit status into an exit report
pub fn exit_report(status: ExitStatus) -> ExitReport {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitReport::signaled(signal_name(signal));
        }
    }
    ExitReport::exited(status.code().unwrap_or(-1))
}

/// `SIGTERM`-style name of a signal number
#[cfg(unix)]
pub fn signal_name(signal: i32) -> String {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("SIG{}", signal))
}

/// Handle to a child started by [`ProcessLauncher`]
struct ChildHandle {
    pid: Option<u32>,
    /// Stop requests go through the exit watcher, which owns the `Child`
    control_tx: mpsc::UnboundedSender<Control>,
    killed: bool,
}

impl ChildHandle {
    fn request(&self, request: Control) {
        if self.control_tx.send(request).is_err() {
            debug!("{:?} requested for pid {:?} after exit watcher finished", request, self.pid);
        }
    }
}

impl ProcessHandle for ChildHandle {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn terminate(&mut self) -> Result<()> {
        self.request(Control::Terminate);
        Ok(())
    }

    fn kill(&mut self) -> Result<()> {
        if !self.killed {
            self.killed = true;
            self.request(Control::Kill);
        }
        Ok(())
    }
}

/// Send `signal` to `pid`; a process that is already gone is not an error
#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) -> Result<()> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    debug!("Sending {} to process {}", signal, pid);

    match kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => {
            debug!("Process {} already exited", pid);
            Ok(())
        }
        Err(e) => Err(Error::Signal(format!(
            "Failed to send {} to process {}: {}",
            signal, pid, e
        ))),
    }
}
