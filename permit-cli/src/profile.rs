//! Simulated device profiles.
//!
//! A profile describes a device's API level, the app's package name and the
//! starting state of each capability:
//!
//! ```json
//! {
//!   "api_level": 30,
//!   "package": "com.example.app",
//!   "capabilities": {
//!     "android.permission.ACCESS_FINE_LOCATION": { "state": "granted" },
//!     "android.permission.READ_CONTACTS": { "state": "rationale" },
//!     "android.permission.READ_SMS": { "state": "granted", "op_mode": "ignored" },
//!     "android.permission.READ_CALL_LOG": { "state": "blocked" }
//!   }
//! }
//! ```
//!
//! Capabilities missing from the profile start denied and never declined.
//! Blocked capabilities are refused at once without showing a dialog.

use crate::error::CliError;
use parking_lot::Mutex;
use permit_core::{
    ApiLevelProbe, Capability, GrantResult, HostError, OpMode, PermissionHost, RequestCode,
    RUNTIME_GRANTS_API_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Starting state of one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileState {
    Granted,
    /// Never asked.
    #[default]
    Denied,
    /// Denied before; the platform wants an explanation first.
    Rationale,
    /// Denied with "don't ask again". Only the settings page can grant it.
    Blocked,
}

/// Per-capability profile entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityProfile {
    pub state: ProfileState,
    pub op_mode: OpMode,
    /// Whether the capability has an app-op.
    pub has_op: bool,
}

impl Default for CapabilityProfile {
    fn default() -> Self {
        Self {
            state: ProfileState::default(),
            op_mode: OpMode::default(),
            has_op: true,
        }
    }
}

/// A simulated device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub api_level: u32,
    pub package: String,
    pub capabilities: BTreeMap<Capability, CapabilityProfile>,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            api_level: RUNTIME_GRANTS_API_LEVEL,
            package: "com.example.app".to_string(),
            capabilities: BTreeMap::new(),
        }
    }
}

impl DeviceProfile {
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), CliError> {
        if self.package.trim().is_empty() {
            return Err(CliError::Profile("package must not be empty".into()));
        }
        Ok(())
    }

    /// Probe for this device's API level.
    pub fn probe(&self) -> ApiLevelProbe {
        ApiLevelProbe::new(self.api_level)
    }
}

/// Load and validate a profile from a JSON file.
pub async fn load_profile(path: impl AsRef<Path>) -> Result<DeviceProfile, CliError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    DeviceProfile::from_json(&content)
}

/// A host request waiting for the simulated system dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub capabilities: Vec<Capability>,
    pub code: RequestCode,
    /// Aligned with `capabilities`: entries blocked when the request arrived.
    pub blocked: Vec<bool>,
}

impl PendingRequest {
    /// Capabilities the system dialog shows, in request order.
    pub fn shown(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities
            .iter()
            .zip(&self.blocked)
            .filter(|(_, blocked)| !**blocked)
            .map(|(capability, _)| capability)
    }
}

/// What the user picked in the system dialog for one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAnswer {
    Allow,
    Deny,
    /// Deny and stop the platform from asking or explaining again.
    DenyAlways,
}

#[derive(Debug)]
struct DeviceState {
    capabilities: BTreeMap<Capability, CapabilityProfile>,
    pending: Option<PendingRequest>,
    settings_opened: usize,
}

/// A [`PermissionHost`] backed by a [`DeviceProfile`].
///
/// Clones share state. Permission requests are parked until
/// [`SimulatedHost::take_pending`] hands them to the system dialog, and the
/// dialog's answers update the device state the next negotiation sees.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    package: String,
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedHost {
    pub fn new(profile: &DeviceProfile) -> Self {
        Self {
            package: profile.package.clone(),
            state: Arc::new(Mutex::new(DeviceState {
                capabilities: profile.capabilities.clone(),
                pending: None,
                settings_opened: 0,
            })),
        }
    }

    /// The request waiting for an answer, if any.
    pub fn take_pending(&self) -> Option<PendingRequest> {
        self.state.lock().pending.take()
    }

    /// Apply dialog answers and return the platform's result codes.
    ///
    /// Answers pair with [`PendingRequest::shown`] in order. Blocked entries
    /// are denied without an answer and stay blocked. A missing answer
    /// counts as [`DialogAnswer::Deny`].
    pub fn apply(&self, request: &PendingRequest, answers: &[DialogAnswer]) -> Vec<i32> {
        let mut state = self.state.lock();
        let mut answers = answers.iter().copied();
        request
            .capabilities
            .iter()
            .zip(&request.blocked)
            .map(|(capability, blocked)| {
                if *blocked {
                    return GrantResult::Denied.code();
                }
                let answer = answers.next().unwrap_or(DialogAnswer::Deny);
                let entry = state.capabilities.entry(capability.clone()).or_default();
                entry.state = match answer {
                    DialogAnswer::Allow => ProfileState::Granted,
                    DialogAnswer::Deny => ProfileState::Rationale,
                    DialogAnswer::DenyAlways => ProfileState::Blocked,
                };
                GrantResult::from(answer == DialogAnswer::Allow).code()
            })
            .collect()
    }

    /// Current state of a capability.
    pub fn state_of(&self, capability: &Capability) -> ProfileState {
        self.state
            .lock()
            .capabilities
            .get(capability)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    pub fn settings_opened(&self) -> usize {
        self.state.lock().settings_opened
    }
}

impl PermissionHost for SimulatedHost {
    fn package_name(&self) -> &str {
        &self.package
    }

    fn permission_to_op(&self, capability: &Capability) -> Option<String> {
        let state = self.state.lock();
        match state.capabilities.get(capability) {
            Some(entry) if !entry.has_op => None,
            _ => Some(capability.as_str().to_string()),
        }
    }

    /// Ops are named after their capability, so the op string is the key.
    fn note_proxy_op(&self, op: &str, _package: &str) -> OpMode {
        self.state
            .lock()
            .capabilities
            .get(&Capability::new(op))
            .map(|entry| entry.op_mode)
            .unwrap_or_default()
    }

    fn check_self_permission(&self, capability: &Capability) -> GrantResult {
        GrantResult::from(self.state_of(capability) == ProfileState::Granted)
    }

    fn should_show_rationale(&self, capability: &Capability) -> bool {
        self.state_of(capability) == ProfileState::Rationale
    }

    fn request_permissions(&self, capabilities: &[Capability], code: RequestCode) {
        let mut state = self.state.lock();
        if let Some(previous) = &state.pending {
            log::warn!("request {} replaced unanswered request {}", code, previous.code);
        }
        let blocked = capabilities
            .iter()
            .map(|capability| {
                state
                    .capabilities
                    .get(capability)
                    .is_some_and(|entry| entry.state == ProfileState::Blocked)
            })
            .collect();
        state.pending = Some(PendingRequest {
            capabilities: capabilities.to_vec(),
            code,
            blocked,
        });
    }

    fn open_app_settings(&self) -> Result<(), HostError> {
        self.state.lock().settings_opened += 1;
        println!("\n\x1b[36m[settings]\x1b[0m app details for {}", self.package);
        Ok(())
    }
}
