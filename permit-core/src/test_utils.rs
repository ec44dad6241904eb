//! Test utilities for permit-core.
//!
//! This module provides fake host seams for testing negotiations without a
//! real platform behind them.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! permit-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use permit_core::capability::READ_SMS;
//! use permit_core::test_utils::{FakeHost, FixedProbe, OutcomeRecorder, ScriptedPrompter};
//! use permit_core::Negotiator;
//!
//! let host = FakeHost::new().with_granted(READ_SMS);
//! let mut negotiator = Negotiator::new(host, FixedProbe::runtime(), ScriptedPrompter::new());
//!
//! let recorder = OutcomeRecorder::new();
//! negotiator.request_multi_permissions(vec![READ_SMS], recorder.callback());
//! assert_eq!(recorder.count(), 1);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capability::{Capability, GrantResult};
use crate::host::{
    ConfirmPrompt, HostError, OpMode, PermissionHost, PromptChoice, Prompter, RuntimeGrantProbe,
};
use crate::negotiation::{Outcome, PermissionGrant, RequestCode};

#[derive(Default)]
struct HostState {
    granted: HashSet<Capability>,
    rationale: HashSet<Capability>,
    op_modes: HashMap<String, OpMode>,
    without_op: HashSet<Capability>,
    settings_failure: Option<String>,

    queries: Vec<Capability>,
    rationale_queries: Vec<Capability>,
    noted_ops: Vec<(String, String)>,
    requests: Vec<(Vec<Capability>, RequestCode)>,
    settings_opened: usize,
}

/// An in-memory host with scriptable grant state.
///
/// Clones share state, so a test can hand one clone to a negotiator and
/// inspect or change live state through another. Every capability maps to an
/// operation named after the full capability unless [`FakeHost::without_op`]
/// says otherwise.
///
/// # Example
///
/// ```rust
/// use permit_core::capability::{READ_CONTACTS, READ_SMS};
/// use permit_core::test_utils::FakeHost;
///
/// let host = FakeHost::new()
///     .with_granted(READ_SMS)
///     .with_rationale(READ_CONTACTS);
/// ```
#[derive(Clone)]
pub struct FakeHost {
    package: String,
    state: Arc<Mutex<HostState>>,
}

impl FakeHost {
    /// Create a host where nothing is granted.
    pub fn new() -> Self {
        Self {
            package: "com.example.permit".to_string(),
            state: Arc::new(Mutex::new(HostState::default())),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Mark a capability granted.
    pub fn with_granted(self, capability: Capability) -> Self {
        self.grant(capability);
        self
    }

    /// Mark a capability as owing a rationale.
    pub fn with_rationale(self, capability: Capability) -> Self {
        self.set_rationale(capability, true);
        self
    }

    /// Set the op gate's mode for a capability.
    pub fn with_op_mode(self, capability: Capability, mode: OpMode) -> Self {
        self.state
            .lock()
            .op_modes
            .insert(capability.as_str().to_string(), mode);
        self
    }

    /// Remove the host operation for a capability.
    pub fn without_op(self, capability: Capability) -> Self {
        self.state.lock().without_op.insert(capability);
        self
    }

    /// Make [`PermissionHost::open_app_settings`] fail.
    pub fn with_settings_failure(self, message: impl Into<String>) -> Self {
        self.state.lock().settings_failure = Some(message.into());
        self
    }

    pub fn grant(&self, capability: Capability) {
        self.state.lock().granted.insert(capability);
    }

    pub fn revoke(&self, capability: &Capability) {
        self.state.lock().granted.remove(capability);
    }

    pub fn set_rationale(&self, capability: Capability, owed: bool) {
        let mut state = self.state.lock();
        if owed {
            state.rationale.insert(capability);
        } else {
            state.rationale.remove(&capability);
        }
    }

    /// Capabilities whose operation was looked up, in call order.
    pub fn queries(&self) -> Vec<Capability> {
        self.state.lock().queries.clone()
    }

    /// Capabilities whose rationale flag was read, in call order.
    pub fn rationale_queries(&self) -> Vec<Capability> {
        self.state.lock().rationale_queries.clone()
    }

    /// `(op, package)` pairs noted against the op gate.
    pub fn noted_ops(&self) -> Vec<(String, String)> {
        self.state.lock().noted_ops.clone()
    }

    /// Every permission request made, in order.
    pub fn requests(&self) -> Vec<(Vec<Capability>, RequestCode)> {
        self.state.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<(Vec<Capability>, RequestCode)> {
        self.state.lock().requests.last().cloned()
    }

    pub fn settings_opened(&self) -> usize {
        self.state.lock().settings_opened
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionHost for FakeHost {
    fn package_name(&self) -> &str {
        &self.package
    }

    fn permission_to_op(&self, capability: &Capability) -> Option<String> {
        let mut state = self.state.lock();
        state.queries.push(capability.clone());
        if state.without_op.contains(capability) {
            None
        } else {
            Some(capability.as_str().to_string())
        }
    }

    fn note_proxy_op(&self, op: &str, package: &str) -> OpMode {
        let mut state = self.state.lock();
        state.noted_ops.push((op.to_string(), package.to_string()));
        state.op_modes.get(op).copied().unwrap_or_default()
    }

    fn check_self_permission(&self, capability: &Capability) -> GrantResult {
        GrantResult::from(self.state.lock().granted.contains(capability))
    }

    fn should_show_rationale(&self, capability: &Capability) -> bool {
        let mut state = self.state.lock();
        state.rationale_queries.push(capability.clone());
        state.rationale.contains(capability)
    }

    fn request_permissions(&self, capabilities: &[Capability], code: RequestCode) {
        self.state
            .lock()
            .requests
            .push((capabilities.to_vec(), code));
    }

    fn open_app_settings(&self) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if let Some(message) = &state.settings_failure {
            return Err(HostError::Settings(message.clone()));
        }
        state.settings_opened += 1;
        Ok(())
    }
}

/// A probe with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedProbe(pub bool);

impl FixedProbe {
    /// A host that enforces runtime grants.
    pub fn runtime() -> Self {
        Self(true)
    }

    /// A host from before runtime grants.
    pub fn legacy() -> Self {
        Self(false)
    }
}

impl RuntimeGrantProbe for FixedProbe {
    fn enforces_runtime_grants(&self) -> bool {
        self.0
    }
}

/// A prompter that answers from a queue and records what it was shown.
///
/// When the queue runs dry it declines.
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    answers: Arc<Mutex<VecDeque<PromptChoice>>>,
    prompts: Arc<Mutex<Vec<ConfirmPrompt>>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next answer.
    pub fn answer(self, choice: PromptChoice) -> Self {
        self.answers.lock().push_back(choice);
        self
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<ConfirmPrompt> {
        self.prompts.lock().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &ConfirmPrompt) -> PromptChoice {
        self.prompts.lock().push(prompt.clone());
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(PromptChoice::Decline)
    }
}

/// Records every outcome delivered to its callbacks.
///
/// Used to check that a negotiation fires its callback exactly once.
#[derive(Clone, Default)]
pub struct OutcomeRecorder {
    outcomes: Arc<Mutex<Vec<Outcome>>>,
}

impl OutcomeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records into this recorder.
    pub fn callback(&self) -> impl PermissionGrant + 'static {
        let outcomes = Arc::clone(&self.outcomes);
        move |outcome: Outcome| outcomes.lock().push(outcome)
    }

    /// Number of callback invocations so far.
    pub fn count(&self) -> usize {
        self.outcomes.lock().len()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().clone()
    }

    /// The only recorded outcome.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one outcome was recorded.
    pub fn single(&self) -> Outcome {
        let outcomes = self.outcomes.lock();
        assert_eq!(outcomes.len(), 1, "expected exactly one outcome");
        outcomes[0].clone()
    }
}
