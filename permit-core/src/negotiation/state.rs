//! Per-negotiation state machine.

use super::outcome::{Outcome, OutcomePath, PermissionGrant};
use super::RequestCode;
use crate::capability::{Capability, GrantResult};
use crate::classify::Classification;
use crate::events::{HookRegistry, NegotiationEvent};

/// Where a negotiation is in its lifecycle.
///
/// ```text
/// Idle ─┬─> FreshRequested ─────(host result)──> Completed
///       ├─> RationaleRequested ─(host result)──> Completed
///       └─> Satisfied
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    /// Classified, no path chosen yet.
    Idle,
    /// Never-declined capabilities were requested from the host.
    FreshRequested,
    /// The user accepted the rationale prompt and the host was asked again.
    RationaleRequested,
    /// Finished without a host round trip (all granted, or rationale declined).
    Satisfied,
    /// Finished with the host's answer.
    Completed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NegotiationState::Satisfied | NegotiationState::Completed)
    }
}

/// What happened to a host result handed to a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The callback fired with this result.
    Delivered,
    /// The result was dropped; nothing changed.
    Ignored(IgnoreReason),
}

impl Delivery {
    pub fn is_delivered(self) -> bool {
        self == Delivery::Delivered
    }
}

/// Why a host result was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The result belongs to another request.
    UnknownRequestCode {
        expected: RequestCode,
        received: RequestCode,
    },
    /// The negotiation is not waiting for a host result.
    NotAwaitingResult(NegotiationState),
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::UnknownRequestCode { expected, received } => {
                write!(f, "request code {} does not match {}", received, expected)
            }
            IgnoreReason::NotAwaitingResult(state) => {
                write!(f, "negotiation is not awaiting a result ({:?})", state)
            }
        }
    }
}

/// One in-flight or finished negotiation.
///
/// Owned by the lifecycle collaborator. Dropping it before the host answers
/// drops the callback without running it.
pub struct Negotiation {
    request_code: RequestCode,
    requested: Vec<Capability>,
    asked: Vec<Capability>,
    classification: Classification,
    state: NegotiationState,
    callback: Option<Box<dyn PermissionGrant>>,
    hooks: HookRegistry,
}

impl Negotiation {
    pub(crate) fn new(
        request_code: RequestCode,
        requested: Vec<Capability>,
        classification: Classification,
        callback: Box<dyn PermissionGrant>,
        hooks: HookRegistry,
    ) -> Self {
        Self {
            request_code,
            requested,
            asked: Vec::new(),
            classification,
            state: NegotiationState::Idle,
            callback: Some(callback),
            hooks,
        }
    }

    pub fn request_code(&self) -> RequestCode {
        self.request_code
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn requested(&self) -> &[Capability] {
        &self.requested
    }

    /// Capabilities sent to the host, empty when the host was never asked.
    pub fn asked(&self) -> &[Capability] {
        &self.asked
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// True while waiting for the host's answer.
    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }

    /// Forward the host's asynchronous permission result.
    ///
    /// `grant_results` uses the host convention (`0` granted, anything else
    /// denied) and is expected to align with `permissions`. Results with a
    /// different request code, or arriving after the negotiation finished,
    /// are ignored without side effects.
    pub fn on_request_permissions_result(
        &mut self,
        request_code: RequestCode,
        permissions: &[Capability],
        grant_results: &[i32],
    ) -> Delivery {
        if request_code != self.request_code {
            return self.ignore(
                request_code,
                IgnoreReason::UnknownRequestCode {
                    expected: self.request_code,
                    received: request_code,
                },
            );
        }

        let path = match self.state {
            NegotiationState::FreshRequested => OutcomePath::FreshRequest,
            NegotiationState::RationaleRequested => OutcomePath::RationaleRequest,
            other => return self.ignore(request_code, IgnoreReason::NotAwaitingResult(other)),
        };

        if permissions.len() != grant_results.len() {
            log::warn!(
                "request {}: host reported {} permissions but {} results",
                request_code,
                permissions.len(),
                grant_results.len()
            );
        }

        let results = grant_results
            .iter()
            .copied()
            .map(GrantResult::from_code)
            .collect();
        self.finish(
            NegotiationState::Completed,
            path,
            permissions.to_vec(),
            results,
        );
        Delivery::Delivered
    }

    pub(crate) fn await_host(&mut self, state: NegotiationState, asked: Vec<Capability>) {
        self.state = state;
        self.asked = asked;
    }

    /// Move to a terminal state and fire the callback.
    pub(crate) fn finish(
        &mut self,
        state: NegotiationState,
        path: OutcomePath,
        asked: Vec<Capability>,
        results: Vec<GrantResult>,
    ) {
        self.state = state;
        let Some(callback) = self.callback.take() else {
            return;
        };

        let outcome = Outcome::new(
            self.request_code,
            asked,
            results,
            self.requested.clone(),
            path,
            self.classification.clone(),
        );
        let denied = outcome.result_vector().denied().len();

        log::info!(
            "request {}: outcome delivered via {:?} ({} of {} denied)",
            self.request_code,
            path,
            denied,
            self.requested.len()
        );
        self.hooks.emit(NegotiationEvent::OutcomeDelivered {
            request_code: self.request_code,
            path,
            denied,
        });

        callback.on_permission_granted(outcome);
    }

    fn ignore(&self, received: RequestCode, reason: IgnoreReason) -> Delivery {
        log::warn!("request {}: ignoring host result: {}", self.request_code, reason);
        self.hooks.emit(NegotiationEvent::ResultIgnored {
            request_code: self.request_code,
            received,
            reason,
        });
        Delivery::Ignored(reason)
    }
}

impl std::fmt::Debug for Negotiation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiation")
            .field("request_code", &self.request_code)
            .field("requested", &self.requested)
            .field("asked", &self.asked)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Drop for Negotiation {
    fn drop(&mut self) {
        if self.callback.is_some() {
            log::debug!(
                "request {}: dropped in {:?}, callback will not run",
                self.request_code,
                self.state
            );
        }
    }
}
