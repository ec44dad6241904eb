//! Negotiator configuration.
//!
//! Configuration can be built in code or loaded from a JSON file:
//!
//! ```json
//! {
//!   "base_request_code": 123,
//!   "declined_rationale": "pass_through",
//!   "rationale_message": "The app is missing permissions. Re-authorize?",
//!   "settings_message": "Open system settings to grant the missing permissions?",
//!   "capabilities": ["android.permission.READ_SMS"]
//! }
//! ```
//!
//! Every field is optional and falls back to [`NegotiatorConfig::default`].

use crate::capability::{standard_set, Capability};
use crate::negotiation::{RequestCode, MAX_REQUEST_CODE};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_RATIONALE_MESSAGE: &str = "The app is missing permissions. Re-authorize?";
pub const DEFAULT_SETTINGS_MESSAGE: &str =
    "Open system settings to grant the missing permissions?";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What the callback receives when the user declines the rationale prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinedRationalePolicy {
    /// Zero-filled results over the requested set, identical to "all granted".
    ///
    /// Kept as the default for compatibility with existing callers even
    /// though the capabilities are still not granted.
    #[default]
    PassThrough,

    /// Every entry that was not granted at classification is reported denied.
    MarkDenied,
}

/// Settings for a [`crate::Negotiator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiatorConfig {
    /// Request code given to the first negotiation; later ones count up.
    pub base_request_code: RequestCode,

    /// Result policy for a declined rationale prompt.
    pub declined_rationale: DeclinedRationalePolicy,

    /// Message of the rationale prompt.
    pub rationale_message: String,

    /// Message of the settings redirect prompt.
    pub settings_message: String,

    /// Capabilities requested by [`crate::Negotiator::request_configured_permissions`].
    pub capabilities: Vec<Capability>,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            base_request_code: RequestCode::DEFAULT,
            declined_rationale: DeclinedRationalePolicy::default(),
            rationale_message: DEFAULT_RATIONALE_MESSAGE.to_string(),
            settings_message: DEFAULT_SETTINGS_MESSAGE.to_string(),
            capabilities: standard_set(),
        }
    }
}

impl NegotiatorConfig {
    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = if json.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(json)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_request_code.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "base_request_code {} outside 0..={}",
                self.base_request_code, MAX_REQUEST_CODE
            )));
        }
        if self.rationale_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "rationale_message must not be empty".to_string(),
            ));
        }
        if self.settings_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "settings_message must not be empty".to_string(),
            ));
        }
        if self.capabilities.is_empty() {
            return Err(ConfigError::Invalid(
                "capabilities must not be empty".to_string(),
            ));
        }
        if let Some(blank) = self.capabilities.iter().position(|c| c.as_str().trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "capability at index {} is blank",
                blank
            )));
        }
        Ok(())
    }
}

/// Load configuration from a JSON file.
///
/// The path is expanded using shell expansion (e.g., `~/.config/permit.json`).
/// An empty file yields the defaults.
pub async fn load_config_file(path: impl AsRef<Path>) -> Result<NegotiatorConfig, ConfigError> {
    let path_str = path.as_ref().to_string_lossy().to_string();
    let expanded_path = shellexpand::tilde(&path_str);
    let path = Path::new(expanded_path.as_ref());

    let content = tokio::fs::read_to_string(path).await?;
    log::debug!("loaded negotiator config from {}", path.display());

    NegotiatorConfig::from_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{READ_CONTACTS, READ_SMS};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = NegotiatorConfig::default();
        assert_eq!(config.base_request_code, RequestCode(123));
        assert_eq!(config.declined_rationale, DeclinedRationalePolicy::PassThrough);
        assert_eq!(config.capabilities, standard_set());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = NegotiatorConfig::from_json(
            r#"{"declined_rationale": "mark_denied", "capabilities": ["android.permission.READ_SMS", "android.permission.READ_CONTACTS"]}"#,
        )
        .unwrap();

        assert_eq!(config.declined_rationale, DeclinedRationalePolicy::MarkDenied);
        assert_eq!(config.capabilities, vec![READ_SMS, READ_CONTACTS]);
        assert_eq!(config.base_request_code, RequestCode::DEFAULT);
        assert_eq!(config.rationale_message, DEFAULT_RATIONALE_MESSAGE);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(NegotiatorConfig::from_json("  \n").unwrap(), NegotiatorConfig::default());
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            r#"{"base_request_code": -5}"#,
            r#"{"base_request_code": 70000}"#,
            r#"{"rationale_message": "  "}"#,
            r#"{"settings_message": ""}"#,
            r#"{"capabilities": []}"#,
            r#"{"capabilities": ["android.permission.READ_SMS", " "]}"#,
        ];

        for json in cases {
            let err = NegotiatorConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{} -> {:?}", json, err);
        }
    }

    #[test]
    fn test_unknown_policy_is_json_error() {
        let err = NegotiatorConfig::from_json(r#"{"declined_rationale": "maybe"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[tokio::test]
    async fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_request_code": 42}}"#).unwrap();

        let config = load_config_file(file.path()).await.unwrap();
        assert_eq!(config.base_request_code, RequestCode(42));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_config_file("/nonexistent/permit/config.json")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
