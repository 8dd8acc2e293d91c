//! Supervisor - launches the replicas and runs the event loop
//!
//! ## Architecture
//! ```text
//! exit watchers ─┐
//! line readers  ─┼─► event channel ─► Supervisor::handle_event
//! grace timers  ─┤                      ├─► Exited / LaunchFailed → exit observer
//! interrupts    ─┘                      ├─► GraceExpired          → escalate (SIGKILL)
//!                                       ├─► Interrupt             → request_shutdown
//!                                       └─► Line / StreamClosed   → log sink
//! ```
//!
//! The loop is the only writer of the registry and the shutdown state. It
//! ends once every slot is terminated. Output still buffered at that point is
//! drained for at most the graceful timeout; an interrupt cuts the drain
//! short, since a background grandchild may hold a pipe open indefinitely.

use crate::event::{self, EventReceiver, EventSender, SupervisorEvent};
use crate::executor::{launch, LaunchPlan, Launcher};
use crate::log::LogSink;
use crate::registry::Registry;
use crate::shutdown::{ShutdownCoordinator, ShutdownReason};
use crate::task::{ExitReport, TaskOutcome};
use herd_foundation::{Error, LogRecord, Result, Severity, StreamKind, SupervisorConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Outcome per replica index
    pub outcomes: Vec<TaskOutcome>,
    /// Why shutdown was initiated, if it was
    pub shutdown: Option<ShutdownReason>,
}

impl RunReport {
    /// Every replica exited with status 0
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::is_success)
    }

    /// Indices whose outcome would trigger fail-fast
    pub fn failed(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.triggers_fail_fast())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Replica supervisor
pub struct Supervisor<L: Launcher> {
    config: SupervisorConfig,
    plan: LaunchPlan,
    launcher: L,
    sink: Arc<dyn LogSink>,
    registry: Registry,
    shutdown: ShutdownCoordinator,
    open_streams: usize,
    events_tx: EventSender,
    events_rx: EventReceiver,
}

impl<L: Launcher> Supervisor<L> {
    /// Validate `config` and prepare an idle supervisor
    pub fn new(config: SupervisorConfig, launcher: L, sink: Arc<dyn LogSink>) -> Result<Self> {
        config.validate()?;
        let plan = LaunchPlan::from_config(&config)?;
        let (events_tx, events_rx) = event::channel();

        Ok(Self {
            registry: Registry::new(config.count),
            shutdown: ShutdownCoordinator::new(config.timeout()),
            plan,
            config,
            launcher,
            sink,
            open_streams: 0,
            events_tx,
            events_rx,
        })
    }

    /// Sender for injecting events (interrupts) from outside the loop
    pub fn events(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Launch every replica and supervise until all have terminated
    pub async fn run(mut self) -> Result<RunReport> {
        self.launch_all()?;

        while !self.registry.is_finished() {
            match self.events_rx.recv().await {
                Some(event) => self.handle_event(event),
                // Cannot happen while `events_tx` is held
                None => break,
            }
        }
        self.drain_streams().await;

        info!(
            "All {} tasks terminated (shutdown: {:?})",
            self.registry.len(),
            self.shutdown.reason()
        );
        self.into_report()
    }

    fn launch_all(&mut self) -> Result<()> {
        for index in 0..self.plan.count() {
            let launched = launch(
                &self.launcher,
                &self.plan,
                index,
                &self.events_tx,
                self.sink.as_ref(),
            );
            self.open_streams += launched.output_streams;
            self.registry.register(launched.task)?;
        }
        debug!(
            "Launched {} tasks with {} output streams",
            self.registry.len(),
            self.open_streams
        );
        Ok(())
    }

    /// Forward output still in flight after the last task terminated.
    ///
    /// Bounded by the graceful timeout. An interrupt ends the drain at once.
    async fn drain_streams(&mut self) {
        if self.open_streams == 0 {
            return;
        }
        debug!(
            "All tasks terminated, draining {} output streams",
            self.open_streams
        );

        let deadline = tokio::time::sleep(self.shutdown.timeout());
        tokio::pin!(deadline);

        while self.open_streams > 0 {
            tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(SupervisorEvent::Interrupt) => {
                        self.request_shutdown(ShutdownReason::Interrupt);
                        debug!("Interrupted while draining, {} streams left open", self.open_streams);
                        return;
                    }
                    Some(event) => self.handle_event(event),
                    None => return,
                },
                _ = &mut deadline => {
                    warn!(
                        "{} output streams still open {:?} after the last task exited, detaching",
                        self.open_streams,
                        self.shutdown.timeout()
                    );
                    return;
                }
            }
        }
    }

    fn into_report(self) -> Result<RunReport> {
        let outcomes = self
            .registry
            .outcomes()
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.ok_or_else(|| Error::Internal(format!("task {} never terminated", index)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RunReport {
            outcomes,
            shutdown: self.shutdown.reason(),
        })
    }

    /// Dispatch one event
    pub fn handle_event(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Exited { index, report } => self.on_exit(index, report),
            SupervisorEvent::LaunchFailed { index, error } => self.on_launch_error(index, error),
            SupervisorEvent::Line {
                index,
                stream,
                line,
            } => self.on_line(index, stream, line),
            SupervisorEvent::StreamClosed { index, stream } => {
                debug!("{} of task {} closed", stream, index);
                self.open_streams = self.open_streams.saturating_sub(1);
            }
            SupervisorEvent::GraceExpired { index } => {
                self.shutdown
                    .escalate(index, &mut self.registry, self.sink.as_ref());
            }
            SupervisorEvent::Interrupt => {
                self.request_shutdown(ShutdownReason::Interrupt);
            }
        }
    }

    /// Idempotent shutdown entry point for interrupts and fail-fast
    pub fn request_shutdown(&mut self, reason: ShutdownReason) -> bool {
        self.shutdown.request(
            reason,
            &mut self.registry,
            &self.events_tx,
            self.sink.as_ref(),
        )
    }

    // ========================================================================
    // Exit observer
    // ========================================================================

    fn on_exit(&mut self, index: usize, report: ExitReport) {
        let outcome = TaskOutcome::from_exit(&report);
        let Some(task) = self.registry.terminate(index, outcome.clone()) else {
            return;
        };
        let tag = task.tag();
        drop(task);

        let severity = match &outcome {
            TaskOutcome::KilledBySignal(_) => Severity::Notice,
            TaskOutcome::ExitedClean => Severity::Success,
            _ => Severity::Warning,
        };
        self.sink.record(LogRecord::task(
            tag,
            severity,
            format!("task #{} {}", tag, outcome),
        ));

        // Signal termination never participates in fail-fast
        if self.config.fail_fast && outcome.triggers_fail_fast() {
            self.request_shutdown(ShutdownReason::FailFast { index });
        }
    }

    fn on_launch_error(&mut self, index: usize, error: String) {
        let outcome = TaskOutcome::LaunchFailed(error);
        let Some(task) = self.registry.terminate(index, outcome.clone()) else {
            return;
        };
        let tag = task.tag();

        self.sink.record(LogRecord::task(
            tag,
            Severity::Error,
            format!("task #{} {}", tag, outcome),
        ));

        if self.config.fail_fast {
            self.request_shutdown(ShutdownReason::FailFast { index });
        }
    }

    fn on_line(&mut self, index: usize, stream: StreamKind, line: String) {
        self.sink
            .record(LogRecord::output(self.plan.tag(index), stream, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_summary() {
        let report = RunReport {
            outcomes: vec![
                TaskOutcome::ExitedClean,
                TaskOutcome::ExitedFailed(2),
                TaskOutcome::KilledBySignal("SIGTERM".into()),
                TaskOutcome::LaunchFailed("ENOENT".into()),
            ],
            shutdown: Some(ShutdownReason::FailFast { index: 1 }),
        };
        assert!(!report.is_success());
        assert_eq!(report.failed(), vec![1, 3]);

        let clean = RunReport {
            outcomes: vec![TaskOutcome::ExitedClean; 2],
            shutdown: None,
        };
        assert!(clean.is_success());
        assert!(clean.failed().is_empty());
    }
}
