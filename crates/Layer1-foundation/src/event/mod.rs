//! Event - user-visible log records
//!
//! - `types.rs` - `LogRecord`, `Severity`, `StreamKind`, `TaskTag`

mod types;

pub use types::{digit_count, LogRecord, Severity, StreamKind, TaskTag};
