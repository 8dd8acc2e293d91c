//! herd CLI - Main entry point

mod args;
mod console;
mod signals;

use anyhow::Context;
use args::Args;
use clap::Parser;
use console::ConsoleSink;
use herd_foundation::Error;
use herd_task::{ProcessLauncher, Supervisor};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr so they never interleave with task output
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = args.to_config().map_err(startup_error)?;
    let sink = Arc::new(ConsoleSink::new(args.use_color()));

    let supervisor =
        Supervisor::new(config, ProcessLauncher::new(), sink).map_err(startup_error)?;

    let _interrupts = signals::forward_interrupts(supervisor.events())
        .context("Failed to install signal handlers")?;

    let report = supervisor.run().await?;
    tracing::debug!(
        "Run finished: {} tasks, shutdown {:?}",
        report.outcomes.len(),
        report.shutdown
    );

    Ok(())
}

/// Errors raised before any child is launched
fn startup_error(error: Error) -> anyhow::Error {
    let context = if error.is_setup_error() {
        "Invalid configuration"
    } else {
        "Failed to start herd"
    };
    anyhow::Error::new(error).context(context)
}
