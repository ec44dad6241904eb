//! Top-level error types for permit
//!
//! Negotiation itself never fails: ignored results and declined prompts are
//! outcomes, not errors. Errors come from loading configuration and from
//! host operations such as the settings redirect.

use thiserror::Error;

use crate::config::ConfigError;
use crate::host::HostError;

/// Top-level error type for permit operations
///
/// - [`Error::Config`] - Fix the configuration file or builder values
/// - [`Error::Host`] - The host rejected an operation
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// Host operation failed
    #[error("host error: {0}")]
    Host(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a host error
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<HostError> for Error {
    fn from(err: HostError) -> Self {
        Self::Host(err.to_string())
    }
}

/// Result type for permit operations
pub type Result<T> = std::result::Result<T, Error>;
