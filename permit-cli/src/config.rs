//! Locating the negotiator configuration.

use crate::error::CliError;
use permit_core::{load_config_file, NegotiatorConfig};
use std::path::{Path, PathBuf};

/// Default configuration path: `<config dir>/permit/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("permit").join("config.json"))
}

/// Load the configuration for a run.
///
/// An explicit path must exist. Otherwise the default path is used when the
/// file is there, and built-in defaults when it is not.
pub async fn resolve_config(explicit: Option<&Path>) -> Result<NegotiatorConfig, CliError> {
    if let Some(path) = explicit {
        return Ok(load_config_file(path).await?);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            log::debug!("loading config from {}", path.display());
            Ok(load_config_file(&path).await?)
        }
        _ => Ok(NegotiatorConfig::default()),
    }
}
