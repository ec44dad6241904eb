//! # Permit
//!
//! Runtime permission negotiation for hosts that gate capabilities (location,
//! storage, contacts, phone state, SMS, call log) behind explicit user grants.
//!
//! Permit decides, for a fixed set of requested capabilities, which must be
//! requested fresh, which need an explanation before asking again, and which
//! are already granted. It then drives a single outcome callback exactly once
//! with results aligned to the requested set.
//!
//! ## Quick Start
//!
//! ```rust
//! use permit_core::capability::{ACCESS_FINE_LOCATION, READ_SMS};
//! use permit_core::test_utils::{FakeHost, FixedProbe, ScriptedPrompter};
//! use permit_core::{Negotiator, Outcome};
//!
//! let host = FakeHost::new().with_granted(ACCESS_FINE_LOCATION);
//! let mut negotiator = Negotiator::new(host.clone(), FixedProbe::runtime(), ScriptedPrompter::new());
//!
//! let mut negotiation = negotiator.request_multi_permissions(
//!     vec![ACCESS_FINE_LOCATION, READ_SMS],
//!     |outcome: Outcome| {
//!         for (capability, result) in &outcome.result_vector() {
//!             println!("{}: {}", capability.short_name(), result);
//!         }
//!     },
//! );
//!
//! // Only the missing capability is requested from the host
//! let (asked, code) = host.last_request().unwrap();
//! assert_eq!(asked, vec![READ_SMS]);
//!
//! // Later, the host reports the user's answer
//! negotiation.on_request_permissions_result(code, &asked, &[0]);
//! assert!(negotiation.is_terminal());
//! ```
//!
//! ## Host Integration
//!
//! Implement [`PermissionHost`] over the platform's permission APIs,
//! [`RuntimeGrantProbe`] over its version check (or use [`ApiLevelProbe`]),
//! and [`Prompter`] over a modal dialog. Keep the returned [`Negotiation`]
//! alive for as long as the screen that started it, and forward the
//! platform's permission-result event into it.
//!
//! ## Feature Flags
//!
//! - `test-utils` - Fake hosts, probes, prompters and outcome recorders

pub mod capability;
pub mod check;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod negotiation;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use capability::{standard_set, Capability, GrantResult};
pub use check::has_permission;
pub use classify::{classify, Classification, GrantState};
pub use config::{load_config_file, ConfigError, DeclinedRationalePolicy, NegotiatorConfig};
pub use error::{Error, Result};
pub use events::{HookId, NegotiationEvent, NegotiationHook};
pub use host::{
    ApiLevelProbe, ConfirmPrompt, HostError, OpMode, PermissionHost, PromptChoice, PromptKind,
    Prompter, RuntimeGrantProbe, RUNTIME_GRANTS_API_LEVEL,
};
pub use negotiation::{
    outcome_channel, Delivery, IgnoreReason, Negotiation, NegotiationState, Negotiator, Outcome,
    OutcomePath, OutcomeReceiver, OutcomeSender, PermissionGrant, RequestCode, ResultVector,
};
pub use settings::open_settings;
