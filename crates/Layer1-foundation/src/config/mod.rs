//! Config - supervisor settings
//!
//! - `supervisor.rs` - `SupervisorConfig` (TOML file + CLI overrides)

mod supervisor;

pub use supervisor::{SupervisorConfig, DEFAULT_TIMEOUT_MS};
