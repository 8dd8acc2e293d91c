//! Console sink - coloured task log on stdout

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use herd_foundation::{LogRecord, Severity};
use herd_task::LogSink;
use std::io::{self, Write};

/// Prints every record as one line on stdout
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn write_record<W: Write>(&self, out: &mut W, record: &LogRecord) -> io::Result<()> {
        let color = if self.color {
            color_of(record.severity)
        } else {
            None
        };

        match (color, record.prefix()) {
            // Output lines: only the tag carries the colour
            (Some(color), Some(prefix)) => execute!(
                out,
                SetForegroundColor(color),
                Print(prefix),
                ResetColor,
                Print(format!(" {}\n", record.message))
            ),
            (Some(color), None) => execute!(
                out,
                SetForegroundColor(color),
                Print(&record.message),
                ResetColor,
                Print("\n")
            ),
            (None, _) => {
                writeln!(out, "{}", record.text())?;
                out.flush()
            }
        }
    }
}

impl LogSink for ConsoleSink {
    fn record(&self, record: LogRecord) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = self.write_record(&mut stdout, &record) {
            tracing::debug!("Failed to write log record: {}", e);
        }
    }
}

fn color_of(severity: Severity) -> Option<Color> {
    match severity {
        Severity::Info => None,
        Severity::Success => Some(Color::Green),
        Severity::Warning => Some(Color::Yellow),
        Severity::Error => Some(Color::Red),
        Severity::Notice => Some(Color::Magenta),
    }
}
