//! Host seams.
//!
//! The negotiator never talks to a platform directly. Everything it needs
//! from the operating system and the user goes through the traits in this
//! module, which the lifecycle collaborator implements:
//!
//! - **[`PermissionHost`]**: grant introspection and the asynchronous request call
//! - **[`RuntimeGrantProbe`]**: whether the host enforces runtime grants at all
//! - **[`Prompter`]**: a modal yes/no choice shown to the user

use crate::capability::{Capability, GrantResult};
use crate::negotiation::RequestCode;

/// API level at which hosts start enforcing runtime grants.
pub const RUNTIME_GRANTS_API_LEVEL: u32 = 23;

/// Errors reported by host operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host could not open its settings screen.
    #[error("Failed to open settings: {0}")]
    Settings(String),

    /// The host rejected an operation for another reason.
    #[error("Host operation failed: {0}")]
    Other(String),
}

/// Mode reported when noting an operation against its app-op gate.
///
/// The op gate can be revoked independently of the declared permission, so
/// a capability may be declared-granted while its operation is `Ignored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpMode {
    #[default]
    Allowed,
    Ignored,
    Errored,
    Default,
}

/// Grant introspection and request plumbing provided by the host.
///
/// Every query must reflect live host state: the classifier calls them on
/// each negotiation and never caches the answers.
pub trait PermissionHost {
    /// Package the app-op gate is checked against.
    fn package_name(&self) -> &str;

    /// Host operation guarding this capability, if any.
    fn permission_to_op(&self, capability: &Capability) -> Option<String>;

    /// Note `op` on behalf of `package` and report the gate's mode.
    fn note_proxy_op(&self, op: &str, package: &str) -> OpMode;

    /// Declared-permission check for this process.
    fn check_self_permission(&self, capability: &Capability) -> GrantResult;

    /// Whether the host wants an explanation shown before asking again.
    fn should_show_rationale(&self, capability: &Capability) -> bool;

    /// Ask the host to show its permission dialog for `capabilities`.
    ///
    /// The answer comes back later through
    /// [`crate::Negotiation::on_request_permissions_result`] tagged with `code`.
    fn request_permissions(&self, capabilities: &[Capability], code: RequestCode);

    /// Open this application's page in the host's system settings.
    fn open_app_settings(&self) -> Result<(), HostError>;
}

/// Answers whether the host enforces runtime grants.
pub trait RuntimeGrantProbe {
    fn enforces_runtime_grants(&self) -> bool;
}

/// Probe backed by a numeric platform API level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiLevelProbe {
    api_level: u32,
}

impl ApiLevelProbe {
    pub fn new(api_level: u32) -> Self {
        Self { api_level }
    }

    pub fn api_level(&self) -> u32 {
        self.api_level
    }
}

impl RuntimeGrantProbe for ApiLevelProbe {
    fn enforces_runtime_grants(&self) -> bool {
        self.api_level >= RUNTIME_GRANTS_API_LEVEL
    }
}

/// Blanket implementation for closures
impl<F> RuntimeGrantProbe for F
where
    F: Fn() -> bool,
{
    fn enforces_runtime_grants(&self) -> bool {
        self()
    }
}

/// Which message a prompt carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Capabilities were declined before; ask whether to request them again.
    Rationale,
    /// Offer to open the system settings page.
    Settings,
}

/// A modal binary choice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub kind: PromptKind,
    pub message: String,
    /// Capabilities the prompt is about (empty for the settings redirect).
    pub capabilities: Vec<Capability>,
}

/// The user's answer to a [`ConfirmPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Accept,
    Decline,
}

impl PromptChoice {
    pub fn is_accept(self) -> bool {
        self == PromptChoice::Accept
    }
}

impl From<bool> for PromptChoice {
    fn from(accept: bool) -> Self {
        if accept {
            PromptChoice::Accept
        } else {
            PromptChoice::Decline
        }
    }
}

/// Shows blocking yes/no prompts.
///
/// Implement this to plug in a dialog, a terminal prompt or a scripted
/// answer in tests.
pub trait Prompter {
    /// Show the prompt and block until the user answers.
    fn confirm(&self, prompt: &ConfirmPrompt) -> PromptChoice;
}

impl<F> Prompter for F
where
    F: Fn(&ConfirmPrompt) -> PromptChoice,
{
    fn confirm(&self, prompt: &ConfirmPrompt) -> PromptChoice {
        self(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_level_probe_threshold() {
        let cases = [(21, false), (22, false), (23, true), (34, true)];

        for (level, expected) in cases {
            assert_eq!(
                ApiLevelProbe::new(level).enforces_runtime_grants(),
                expected,
                "api level {}",
                level
            );
        }
    }

    #[test]
    fn test_closure_probe() {
        let probe = || false;
        assert!(!probe.enforces_runtime_grants());
    }

    #[test]
    fn test_closure_prompter() {
        let prompter =
            |prompt: &ConfirmPrompt| PromptChoice::from(prompt.kind == PromptKind::Settings);
        let prompt = ConfirmPrompt {
            kind: PromptKind::Rationale,
            message: "again?".to_string(),
            capabilities: vec![],
        };
        assert_eq!(prompter.confirm(&prompt), PromptChoice::Decline);
    }

    #[test]
    fn test_op_mode_deserializes_snake_case() {
        let mode: OpMode = serde_json::from_str("\"ignored\"").unwrap();
        assert_eq!(mode, OpMode::Ignored);
    }
}
