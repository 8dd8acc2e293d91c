//! # herd-foundation
//!
//! Foundation layer for herd:
//! - Error: `Error` / `Result` shared by every crate
//! - Config: `SupervisorConfig` (TOML file, CLI overrides, validation)
//! - Template: `{{index}}` substitution for argument and env templates
//! - Event: `LogRecord` and friends, the user-visible log channel

pub mod config;
pub mod error;
pub mod event;
pub mod template;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{SupervisorConfig, DEFAULT_TIMEOUT_MS};

// ============================================================================
// Template
// ============================================================================
pub use template::{render, Template, TemplateContext, INDEX_VAR};

// ============================================================================
// Event
// ============================================================================
pub use event::{digit_count, LogRecord, Severity, StreamKind, TaskTag};
