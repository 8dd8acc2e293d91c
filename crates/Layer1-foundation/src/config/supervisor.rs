//! SupervisorConfig - what to launch and how to shut it down

use crate::error::{Error, Result};
use crate::event::digit_count;
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default graceful shutdown timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn default_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(2)
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Supervisor settings
///
/// Loaded from an optional TOML file and then overridden by command-line
/// flags. Call [`SupervisorConfig::validate`] before handing it to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Executable to launch (never rendered as a template)
    pub command: String,

    /// Argument templates
    pub args: Vec<String>,

    /// Replica count
    pub count: usize,

    /// Graceful shutdown timeout per task
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Shut every task down once one fails
    pub fail_fast: bool,

    /// Optional `key=value` environment override template
    pub env: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            count: default_count(),
            timeout_ms: default_timeout_ms(),
            fail_fast: false,
            env: None,
        }
    }
}

impl SupervisorConfig {
    /// Config for `command` with default policy
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded supervisor config from {}", path.display());
        Ok(config)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Graceful shutdown timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Width of zero-padded task tags
    pub fn padding(&self) -> usize {
        digit_count(self.count)
    }

    /// Parsed argument templates
    pub fn arg_templates(&self) -> Result<Vec<Template>> {
        self.args.iter().map(|a| Template::parse(a)).collect()
    }

    /// Parsed `(key, value)` templates of the environment override
    pub fn env_templates(&self) -> Result<Option<(Template, Template)>> {
        let Some(env) = &self.env else {
            return Ok(None);
        };
        let (key, value) = env
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("env override '{}' is not key=value", env)))?;
        if key.trim().is_empty() {
            return Err(Error::Config(format!("env override '{}' has an empty key", env)));
        }
        Ok(Some((Template::parse(key)?, Template::parse(value)?)))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Reject configurations the supervisor cannot run
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::Config("command cannot be empty".to_string()));
        }

        if self.count == 0 {
            return Err(Error::Config("count must be greater than 0".to_string()));
        }

        self.arg_templates()?;
        self.env_templates()?;

        tracing::debug!(
            "Configuration validated: {} x {} (timeout {}ms, fail-fast {})",
            self.count,
            self.command,
            self.timeout_ms,
            self.fail_fast
        );
        Ok(())
    }
}
