//! Task log output
//!
//! Provides:
//! - `LogSink` - where user-visible records go (console, tracing, tests)
//! - `TracingSink` - default sink that forwards records as tracing events
//! - `stream_lines` - the output streamer that turns a child's byte stream
//!   into line events
//!
//! Lines are forwarded without flow control and without a length cap: a child
//! that writes an endless unterminated line grows the read buffer until
//! memory runs out. This is accepted; truncating or dropping output is not.

use crate::event::{EventSender, SupervisorEvent};
use herd_foundation::{LogRecord, Severity, StreamKind};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, error, info, warn};

/// Destination of user-visible log records
pub trait LogSink: Send + Sync {
    fn record(&self, record: LogRecord);
}

/// Sink that emits each record as a `tracing` event under target `herd`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, record: LogRecord) {
        let task = record.task.map(|t| t.index);
        match record.severity {
            Severity::Warning => warn!(target: "herd", task, "{}", record.text()),
            Severity::Error if record.stream.is_none() => {
                error!(target: "herd", task, "{}", record.text())
            }
            _ => info!(target: "herd", task, "{}", record.text()),
        }
    }
}

/// Read `reader` line by line and forward every line as a `Line` event,
/// then send `StreamClosed`.
///
/// Tolerates `\n` and `\r\n` endings, lines split across reads, a final line
/// without terminator, and invalid UTF-8 (replaced, never dropped).
pub async fn stream_lines<R>(index: usize, stream: StreamKind, reader: R, events: EventSender)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                if events
                    .send(SupervisorEvent::Line {
                        index,
                        stream,
                        line,
                    })
                    .is_err()
                {
                    debug!("Supervisor gone, stop reading {} of task {}", stream, index);
                    return;
                }
            }
            Err(e) => {
                debug!("Read error on {} of task {}: {}", stream, index, e);
                break;
            }
        }
    }

    let _ = events.send(SupervisorEvent::StreamClosed { index, stream });
}

/// Strip the line terminator and decode
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
