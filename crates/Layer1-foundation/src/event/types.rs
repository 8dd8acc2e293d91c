//! Log record types shared by the supervisor core and presentation layers
//!
//! The core never formats colours itself. It emits [`LogRecord`]s and a sink
//! decides how to show them.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Stream
// ============================================================================

/// Which child output stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "STDOUT",
            Self::Stderr => "STDERR",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Highlight level of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Plain informational text
    Info,
    /// Positive outcome (clean exit, stdout)
    Success,
    /// Nonzero exit
    Warning,
    /// Launch failure, stderr, escalation
    Error,
    /// Termination by signal
    Notice,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Notice => "notice",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Info
    }
}

// ============================================================================
// Task tag
// ============================================================================

/// Replica index rendered with zero padding to the width of the replica count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskTag {
    pub index: usize,
    pub width: usize,
}

impl TaskTag {
    /// Tag for `index` among `count` replicas
    pub fn new(index: usize, count: usize) -> Self {
        Self {
            index,
            width: digit_count(count),
        }
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.index, width = self.width)
    }
}

/// Number of decimal digits in `n` (`0` has one digit)
pub fn digit_count(n: usize) -> usize {
    let mut n = n;
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

// ============================================================================
// LogRecord
// ============================================================================

/// One user-visible log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Task the record belongs to, if any
    pub task: Option<TaskTag>,
    /// Set only for forwarded child output
    pub stream: Option<StreamKind>,
    pub severity: Severity,
    pub message: String,
}

impl LogRecord {
    /// Supervisor-level message not tied to a task
    pub fn system(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            task: None,
            stream: None,
            severity,
            message: message.into(),
        }
    }

    /// Lifecycle message about one task
    pub fn task(tag: TaskTag, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            task: Some(tag),
            stream: None,
            severity,
            message: message.into(),
        }
    }

    /// A line read from a child's stdout or stderr
    pub fn output(tag: TaskTag, stream: StreamKind, line: impl Into<String>) -> Self {
        let severity = match stream {
            StreamKind::Stdout => Severity::Success,
            StreamKind::Stderr => Severity::Error,
        };
        Self {
            task: Some(tag),
            stream: Some(stream),
            severity,
            message: line.into(),
        }
    }

    /// `[task-03] [STDOUT]` prefix of an output record
    pub fn prefix(&self) -> Option<String> {
        match (self.task, self.stream) {
            (Some(tag), Some(stream)) => Some(format!("[task-{}] [{}]", tag, stream)),
            _ => None,
        }
    }

    /// Plain text form without any styling
    pub fn text(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("{} {}", prefix, self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
