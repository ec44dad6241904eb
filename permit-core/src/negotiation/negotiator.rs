//! The negotiation orchestrator.

use super::outcome::{OutcomePath, PermissionGrant};
use super::state::{Negotiation, NegotiationState};
use super::{RequestCode, RequestCodes, MAX_REQUEST_CODE};
use crate::capability::{Capability, GrantResult};
use crate::classify::{classify, Classification};
use crate::config::{ConfigError, DeclinedRationalePolicy, NegotiatorConfig};
use crate::events::{HookId, HookRegistry, NegotiationEvent, NegotiationHook};
use crate::host::{
    ConfirmPrompt, HostError, PermissionHost, PromptKind, Prompter, RuntimeGrantProbe,
};
use crate::settings;

/// Drives permission negotiations against one host.
///
/// The negotiator owns the host seams and hands out request codes. It keeps
/// no other state between negotiations: every call reclassifies from live
/// host state.
///
/// # Example
///
/// ```rust
/// use permit_core::capability::{ACCESS_FINE_LOCATION, WRITE_EXTERNAL_STORAGE};
/// use permit_core::negotiation::{Negotiator, NegotiationState, Outcome};
/// use permit_core::test_utils::{FakeHost, FixedProbe, ScriptedPrompter};
///
/// let host = FakeHost::new()
///     .with_granted(ACCESS_FINE_LOCATION)
///     .with_granted(WRITE_EXTERNAL_STORAGE);
/// let mut negotiator = Negotiator::new(host, FixedProbe::runtime(), ScriptedPrompter::new());
///
/// let negotiation = negotiator.request_multi_permissions(
///     vec![ACCESS_FINE_LOCATION, WRITE_EXTERNAL_STORAGE],
///     |outcome: Outcome| assert_eq!(outcome.result_vector().codes(), vec![0, 0]),
/// );
/// assert_eq!(negotiation.state(), NegotiationState::Satisfied);
/// ```
pub struct Negotiator {
    host: Box<dyn PermissionHost>,
    probe: Box<dyn RuntimeGrantProbe>,
    prompter: Box<dyn Prompter>,
    config: NegotiatorConfig,
    codes: RequestCodes,
    hooks: HookRegistry,
}

impl Negotiator {
    /// Create a negotiator with the default configuration.
    pub fn new(
        host: impl PermissionHost + 'static,
        probe: impl RuntimeGrantProbe + 'static,
        prompter: impl Prompter + 'static,
    ) -> Self {
        Self::with_boxed(Box::new(host), Box::new(probe), Box::new(prompter))
    }

    /// Create a negotiator from boxed seams.
    pub fn with_boxed(
        host: Box<dyn PermissionHost>,
        probe: Box<dyn RuntimeGrantProbe>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        let config = NegotiatorConfig::default();
        Self {
            host,
            probe,
            prompter,
            codes: RequestCodes::starting_at(config.base_request_code),
            config,
            hooks: HookRegistry::default(),
        }
    }

    /// Replace the configuration after validating it.
    ///
    /// Request codes restart at the configured base.
    pub fn with_config(mut self, config: NegotiatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.codes = RequestCodes::starting_at(config.base_request_code);
        self.config = config;
        Ok(self)
    }

    /// Set the result policy for a declined rationale prompt.
    pub fn with_declined_rationale(mut self, policy: DeclinedRationalePolicy) -> Self {
        self.config.declined_rationale = policy;
        self
    }

    /// Set the rationale prompt's message.
    pub fn with_rationale_message(mut self, message: impl Into<String>) -> Self {
        self.config.rationale_message = message.into();
        self
    }

    /// Set the settings redirect prompt's message.
    pub fn with_settings_message(mut self, message: impl Into<String>) -> Self {
        self.config.settings_message = message.into();
        self
    }

    /// Set the request code of the next negotiation.
    ///
    /// Fails when `code` is outside `0..=MAX_REQUEST_CODE`.
    pub fn with_base_request_code(mut self, code: RequestCode) -> Result<Self, ConfigError> {
        if !code.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "base_request_code {} outside 0..={}",
                code, MAX_REQUEST_CODE
            )));
        }
        self.config.base_request_code = code;
        self.codes = RequestCodes::starting_at(code);
        Ok(self)
    }

    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    pub fn host(&self) -> &dyn PermissionHost {
        self.host.as_ref()
    }

    /// Add a hook to observe negotiation events.
    ///
    /// Negotiations already started see the hook too.
    pub fn add_hook(&self, hook: impl NegotiationHook + 'static) -> HookId {
        self.hooks.add(hook)
    }

    /// Remove a hook. Returns `true` if it was registered.
    pub fn remove_hook(&self, id: HookId) -> bool {
        self.hooks.remove(id)
    }

    /// Classify `requested` against live host state without negotiating.
    pub fn classify(&self, requested: &[Capability]) -> Classification {
        classify(self.host.as_ref(), self.probe.as_ref(), requested)
    }

    /// Start a negotiation for the configured capability set.
    pub fn request_configured_permissions(
        &mut self,
        callback: impl PermissionGrant + 'static,
    ) -> Negotiation {
        let requested = self.config.capabilities.clone();
        self.request_multi_permissions(requested, callback)
    }

    /// Start a negotiation for `requested`.
    ///
    /// The first matching rule decides the path:
    ///
    /// 1. Any never-declined ungranted capability: the host is asked for
    ///    exactly those. The callback waits for the host's result.
    /// 2. Otherwise, any capability owing a rationale: the rationale prompt is
    ///    shown. On accept the host is asked for exactly those; on decline
    ///    the callback fires at once.
    /// 3. Otherwise everything is granted and the callback fires at once with
    ///    all-zero results.
    ///
    /// The returned [`Negotiation`] must be kept to forward the host's
    /// result. A caller must let one negotiation finish before starting
    /// another that shares the same host dialog.
    pub fn request_multi_permissions(
        &mut self,
        requested: impl Into<Vec<Capability>>,
        callback: impl PermissionGrant + 'static,
    ) -> Negotiation {
        let requested = requested.into();
        let code = self.codes.allocate();
        let classification = self.classify(&requested);

        let fresh = classification.fresh();
        let rationale = classification.rationale();
        let granted = requested.len() - fresh.len() - rationale.len();

        log::debug!(
            "request {}: {} requested, {} granted, {} fresh, {} owe rationale",
            code,
            requested.len(),
            granted,
            fresh.len(),
            rationale.len()
        );
        self.hooks.emit(NegotiationEvent::Classified {
            request_code: code,
            granted,
            fresh: fresh.clone(),
            rationale: rationale.clone(),
        });

        let mut negotiation = Negotiation::new(
            code,
            requested,
            classification,
            Box::new(callback),
            self.hooks.clone(),
        );

        if !fresh.is_empty() {
            self.ask_host(&mut negotiation, fresh, NegotiationState::FreshRequested);
        } else if !rationale.is_empty() {
            self.explain_and_ask(&mut negotiation, rationale);
        } else {
            let all = negotiation.requested().to_vec();
            let results = vec![GrantResult::default(); all.len()];
            negotiation.finish(
                NegotiationState::Satisfied,
                OutcomePath::AlreadyGranted,
                all,
                results,
            );
        }

        negotiation
    }

    /// Offer to open the application's settings page.
    ///
    /// Returns whether the page was opened.
    pub fn open_settings(&self) -> Result<bool, HostError> {
        settings::open_settings(
            self.host.as_ref(),
            self.prompter.as_ref(),
            &self.config.settings_message,
        )
    }

    fn explain_and_ask(&self, negotiation: &mut Negotiation, rationale: Vec<Capability>) {
        let code = negotiation.request_code();
        let prompt = ConfirmPrompt {
            kind: PromptKind::Rationale,
            message: self.config.rationale_message.clone(),
            capabilities: rationale.clone(),
        };

        self.hooks.emit(NegotiationEvent::RationalePrompted {
            request_code: code,
            capabilities: rationale.clone(),
        });

        if self.prompter.confirm(&prompt).is_accept() {
            self.ask_host(negotiation, rationale, NegotiationState::RationaleRequested);
            return;
        }

        log::debug!("request {}: rationale declined", code);
        self.hooks
            .emit(NegotiationEvent::RationaleDeclined { request_code: code });

        let all = negotiation.requested().to_vec();
        let results = match self.config.declined_rationale {
            DeclinedRationalePolicy::PassThrough => vec![GrantResult::default(); all.len()],
            DeclinedRationalePolicy::MarkDenied => negotiation
                .classification()
                .entries()
                .iter()
                .map(|(_, state)| GrantResult::from(state.is_granted()))
                .collect(),
        };
        negotiation.finish(
            NegotiationState::Satisfied,
            OutcomePath::RationaleDeclined,
            all,
            results,
        );
    }

    fn ask_host(
        &self,
        negotiation: &mut Negotiation,
        capabilities: Vec<Capability>,
        state: NegotiationState,
    ) {
        let code = negotiation.request_code();
        log::debug!("request {}: asking host for {:?}", code, capabilities);

        self.hooks.emit(NegotiationEvent::PermissionsRequested {
            request_code: code,
            capabilities: capabilities.clone(),
            after_rationale: state == NegotiationState::RationaleRequested,
        });

        negotiation.await_host(state, capabilities.clone());
        self.host.request_permissions(&capabilities, code);
    }
}

impl std::fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("config", &self.config)
            .field("codes", &self.codes)
            .finish_non_exhaustive()
    }
}
