//! Command-line arguments

use clap::Parser;
use herd_foundation::{Result, SupervisorConfig};
use std::path::PathBuf;

/// herd - run N replicas of a command, stream their output, stop them together
#[derive(Parser, Debug)]
#[command(name = "herd")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Number of replicas [default: 2 x CPU count]
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Graceful shutdown timeout per task, in milliseconds [default: 5000]
    #[arg(short, long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Shut every task down as soon as one fails
    #[arg(short, long)]
    pub fail_fast: bool,

    /// Environment override, key and value may use {{index}}
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Option<String>,

    /// Base configuration file (TOML); flags override its values
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Command to run followed by its argument templates
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl Args {
    /// Merge the optional config file with the flags given on the command line
    pub fn to_config(&self) -> Result<SupervisorConfig> {
        let mut config = match &self.config {
            Some(path) => SupervisorConfig::load(path)?,
            None => SupervisorConfig::default(),
        };

        if let Some((program, args)) = self.command.split_first() {
            config.command = program.clone();
            config.args = args.to_vec();
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = timeout;
        }
        if self.fail_fast {
            config.fail_fast = true;
        }
        if let Some(env) = &self.env {
            config.env = Some(env.clone());
        }

        Ok(config)
    }

    /// Colour unless `--no-color` or a non-empty `NO_COLOR` is set
    pub fn use_color(&self) -> bool {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        !self.no_color && !no_color_env
    }
}
