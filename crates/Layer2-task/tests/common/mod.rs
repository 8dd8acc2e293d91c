//! Test doubles shared by the supervisor integration tests
#![allow(dead_code)]

use herd_foundation::{Error, LogRecord, Result, StreamKind};
use herd_task::{
    EventSender, ExitReport, LaunchSpec, Launcher, LogSink, ProcessHandle, Spawned,
    SupervisorEvent,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Sink
// ============================================================================

/// Sink that keeps every record in memory
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.text()).collect()
    }

    pub fn count(&self, text: &str) -> usize {
        self.texts().iter().filter(|t| t.as_str() == text).count()
    }
}

impl LogSink for MemorySink {
    fn record(&self, record: LogRecord) {
        self.records.lock().push(record);
    }
}

// ============================================================================
// Launcher
// ============================================================================

/// How a fake child reacts to the graceful terminate signal
#[derive(Debug, Clone, Copy)]
pub enum OnTerm {
    /// Die by SIGTERM after the given delay
    Exit(Duration),
    /// Keep running until killed
    Ignore,
}

/// Exit a fake child performs on its own
#[derive(Debug, Clone)]
pub enum ScriptedExit {
    Code(i32),
    Signal(&'static str),
}

#[derive(Default)]
struct Script {
    on_term: Option<OnTerm>,
    failing: Vec<usize>,
    exits: HashMap<usize, (Duration, ScriptedExit)>,
    output: HashMap<usize, Vec<String>>,
    held: Vec<usize>,
    launches: Mutex<Vec<LaunchSpec>>,
    signals: Mutex<Vec<(usize, &'static str)>>,
}

/// Launcher that fakes children and records every signal sent to them
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    script: Arc<Script>,
}

impl ScriptedLauncher {
    pub fn new(on_term: OnTerm) -> Self {
        Self {
            script: Arc::new(Script {
                on_term: Some(on_term),
                ..Script::default()
            }),
        }
    }

    fn script_mut(&mut self) -> &mut Script {
        Arc::get_mut(&mut self.script).expect("configure before cloning")
    }

    /// Make the launch of `index` fail
    pub fn failing(mut self, index: usize) -> Self {
        self.script_mut().failing.push(index);
        self
    }

    /// Let task `index` exit on its own after `delay`
    pub fn exit(mut self, index: usize, delay: Duration, exit: ScriptedExit) -> Self {
        self.script_mut().exits.insert(index, (delay, exit));
        self
    }

    /// Task `index` prints `lines` on stdout right after launch
    pub fn output(mut self, index: usize, lines: &[&str]) -> Self {
        self.script_mut()
            .output
            .insert(index, lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Task `index` leaves a stdout pipe open forever, as a background
    /// grandchild would
    pub fn hold_output(mut self, index: usize) -> Self {
        self.script_mut().held.push(index);
        self
    }

    pub fn launches(&self) -> Vec<LaunchSpec> {
        self.script.launches.lock().clone()
    }

    pub fn signals(&self) -> Vec<(usize, &'static str)> {
        self.script.signals.lock().clone()
    }

    pub fn signals_for(&self, index: usize) -> Vec<&'static str> {
        self.signals()
            .into_iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, s)| s)
            .collect()
    }
}

impl Launcher for ScriptedLauncher {
    fn spawn(&self, spec: &LaunchSpec, events: &EventSender) -> Result<Spawned> {
        self.script.launches.lock().push(spec.clone());
        let index = spec.index;

        if self.script.failing.contains(&index) {
            return Err(Error::launch(&spec.program, "No such file or directory"));
        }

        if let Some((delay, exit)) = self.script.exits.get(&index).cloned() {
            let report = match exit {
                ScriptedExit::Code(code) => ExitReport::exited(code),
                ScriptedExit::Signal(name) => ExitReport::signaled(name),
            };
            send_after(events.clone(), delay, SupervisorEvent::Exited { index, report });
        }

        let mut output_streams = 0;
        if let Some(lines) = self.script.output.get(&index).cloned() {
            output_streams = 1;
            let events = events.clone();
            tokio::spawn(async move {
                for line in lines {
                    let _ = events.send(SupervisorEvent::Line {
                        index,
                        stream: StreamKind::Stdout,
                        line,
                    });
                }
                let _ = events.send(SupervisorEvent::StreamClosed {
                    index,
                    stream: StreamKind::Stdout,
                });
            });
        }

        if self.script.held.contains(&index) {
            output_streams += 1;
        }

        Ok(Spawned {
            handle: Box::new(FakeHandle {
                index,
                script: self.script.clone(),
                events: events.clone(),
            }),
            output_streams,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct FakeHandle {
    index: usize,
    script: Arc<Script>,
    events: EventSender,
}

impl ProcessHandle for FakeHandle {
    fn pid(&self) -> Option<u32> {
        Some(10_000 + self.index as u32)
    }

    fn terminate(&mut self) -> Result<()> {
        self.script.signals.lock().push((self.index, "TERM"));
        if let Some(OnTerm::Exit(delay)) = self.script.on_term {
            send_after(
                self.events.clone(),
                delay,
                SupervisorEvent::Exited {
                    index: self.index,
                    report: ExitReport::signaled("SIGTERM"),
                },
            );
        }
        Ok(())
    }

    fn kill(&mut self) -> Result<()> {
        self.script.signals.lock().push((self.index, "KILL"));
        let _ = self.events.send(SupervisorEvent::Exited {
            index: self.index,
            report: ExitReport::signaled("SIGKILL"),
        });
        Ok(())
    }
}

fn send_after(events: EventSender, delay: Duration, event: SupervisorEvent) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = events.send(event);
    });
}
