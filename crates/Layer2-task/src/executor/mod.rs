//! Process launching
//!
//! Provides:
//! - `Launcher` / `ProcessHandle` - backend seam used by the supervisor
//! - `ProcessLauncher` - host processes via `tokio::process`
//! - `LaunchPlan` / `launch` - per-replica rendering and the launch step

pub mod launch;
pub mod local;
pub mod r#trait;

pub use launch::{launch, LaunchPlan, LaunchSpec, Launched};
pub use local::{exit_report, ProcessLauncher};
#[cfg(unix)]
pub use local::signal_name;
pub use r#trait::{Launcher, ProcessHandle, Spawned};
