//! Launch plan - per-replica argv/env rendering and the launch operation

use crate::event::{EventSender, SupervisorEvent};
use crate::executor::Launcher;
use crate::log::LogSink;
use crate::task::Task;
use herd_foundation::{LogRecord, Result, Severity, SupervisorConfig, TaskTag, Template, TemplateContext};
use tracing::debug;

/// Fully rendered command line of one replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub index: usize,
    pub program: String,
    pub args: Vec<String>,
    /// Rendered `(key, value)` override merged into the inherited environment
    pub env: Option<(String, String)>,
}

impl std::fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Parsed templates for every replica
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    program: String,
    args: Vec<Template>,
    env: Option<(Template, Template)>,
    count: usize,
    width: usize,
}

impl LaunchPlan {
    /// Build from a config. Fails on malformed templates.
    pub fn from_config(config: &SupervisorConfig) -> Result<Self> {
        Ok(Self {
            program: config.command.clone(),
            args: config.arg_templates()?,
            env: config.env_templates()?,
            count: config.count,
            width: config.padding(),
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Log tag for `index`
    pub fn tag(&self, index: usize) -> TaskTag {
        TaskTag {
            index,
            width: self.width,
        }
    }

    /// Render the command line of replica `index`
    pub fn spec(&self, index: usize) -> LaunchSpec {
        let ctx = TemplateContext::new(index);
        LaunchSpec {
            index,
            program: self.program.clone(),
            args: self.args.iter().map(|t| t.render(&ctx)).collect(),
            env: self
                .env
                .as_ref()
                .map(|(key, value)| (key.render(&ctx), value.render(&ctx))),
        }
    }
}

/// Result of one launch attempt
#[derive(Debug)]
pub struct Launched {
    pub task: Task,
    pub output_streams: usize,
}

/// Launch replica `index`
///
/// Never fails synchronously: if the OS refuses to start the process, the
/// task is returned in `Launching` state and a `LaunchFailed` event is queued
/// for the supervisor loop.
pub fn launch<L>(
    launcher: &L,
    plan: &LaunchPlan,
    index: usize,
    events: &EventSender,
    sink: &dyn LogSink,
) -> Launched
where
    L: Launcher + ?Sized,
{
    sink.record(LogRecord::system(
        Severity::Info,
        format!("spawn #{} child process", index + 1),
    ));

    let spec = plan.spec(index);
    let tag = plan.tag(index);

    match launcher.spawn(&spec, events) {
        Ok(spawned) => {
            debug!(
                "Launched task {} via {} (pid {:?}): {}",
                tag,
                launcher.name(),
                spawned.handle.pid(),
                spec
            );
            Launched {
                task: Task::running(index, tag, spawned.handle),
                output_streams: spawned.output_streams,
            }
        }
        Err(e) => {
            debug!("Launch of task {} failed: {}", tag, e);
            let _ = events.send(SupervisorEvent::LaunchFailed {
                index,
                error: e.to_string(),
            });
            Launched {
                task: Task::launching(index, tag),
                output_streams: 0,
            }
        }
    }
}
