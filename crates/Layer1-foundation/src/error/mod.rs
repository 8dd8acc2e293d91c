//! Error types for herd
//!
//! Every fallible operation in the workspace reports through [`Error`].

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// herd error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {template:?} - {message}")]
    Template { template: String, message: String },

    // ========================================================================
    // Process lifecycle
    // ========================================================================
    #[error("Launch failed: {program} - {message}")]
    Launch { program: String, message: String },

    #[error("Signal delivery failed: {0}")]
    Signal(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // Other
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error should stop the supervisor before any child starts
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Template { .. } | Error::Toml(_))
    }

    /// Template error helper
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Launch error helper
    pub fn launch(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Launch {
            program: program.into(),
            message: message.into(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
