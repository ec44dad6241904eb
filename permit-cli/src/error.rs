//! CLI-specific error types

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Negotiation library error
    #[error("Permit error: {0}")]
    Core(#[from] permit_core::Error),

    /// Configuration file error
    #[error("Config error: {0}")]
    Config(#[from] permit_core::ConfigError),

    /// Device profile is invalid
    #[error("Profile error: {0}")]
    Profile(String),

    /// Device profile could not be parsed
    #[error("Profile JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Negotiation did not produce an outcome
    #[error("Session error: {0}")]
    Session(String),

    /// Readline/input error
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// IO error (filesystem, stdout, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<permit_core::HostError> for CliError {
    fn from(err: permit_core::HostError) -> Self {
        Self::Core(err.into())
    }
}
