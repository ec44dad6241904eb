//! Permission negotiation.
//!
//! A [`Negotiator`] classifies a requested capability set against live host
//! state and picks one of three paths:
//!
//! | Classification | Action | Callback fires |
//! |----------------|--------|----------------|
//! | any fresh capability | host request for exactly the fresh subset | on the host's result |
//! | only rationale capabilities | rationale prompt, then host request for that subset | on the host's result, or at once if declined |
//! | everything granted | nothing | at once |
//!
//! Each call returns a [`Negotiation`] owning the callback and its own
//! [`RequestCode`]. The lifecycle collaborator keeps it and forwards the
//! host's asynchronous result to
//! [`Negotiation::on_request_permissions_result`]. Results tagged with any
//! other code are ignored, and the callback fires at most once.
//!
//! Callers must not run two negotiations against the same host dialog at
//! the same time; distinct codes only make stray results harmless.
//!
//! # Example
//!
//! ```rust
//! use permit_core::capability::READ_SMS;
//! use permit_core::negotiation::{Delivery, Negotiator, Outcome};
//! use permit_core::test_utils::{FakeHost, FixedProbe, ScriptedPrompter};
//!
//! let host = FakeHost::new();
//! let mut negotiator = Negotiator::new(host.clone(), FixedProbe::runtime(), ScriptedPrompter::new());
//!
//! let mut negotiation = negotiator.request_multi_permissions(vec![READ_SMS], |outcome: Outcome| {
//!     assert!(outcome.result_vector().all_granted());
//! });
//!
//! // The host asked the user; its answer arrives later
//! let (asked, code) = host.last_request().unwrap();
//! assert_eq!(asked, vec![READ_SMS]);
//! let delivery = negotiation.on_request_permissions_result(code, &asked, &[0]);
//! assert_eq!(delivery, Delivery::Delivered);
//! ```

mod negotiator;
mod outcome;
mod state;

pub use negotiator::Negotiator;
pub use outcome::{
    outcome_channel, Outcome, OutcomePath, OutcomeReceiver, OutcomeSender, PermissionGrant,
    ResultVector,
};
pub use state::{Delivery, IgnoreReason, Negotiation, NegotiationState};

use serde::{Deserialize, Serialize};

/// Largest request code hosts accept (codes are limited to 16 bits).
pub const MAX_REQUEST_CODE: i32 = 0xFFFF;

/// Correlation token binding a host request to its asynchronous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestCode(pub i32);

impl RequestCode {
    /// Code given to the first negotiation unless configured otherwise.
    pub const DEFAULT: RequestCode = RequestCode(123);

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        (0..=MAX_REQUEST_CODE).contains(&self.0)
    }
}

impl Default for RequestCode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for RequestCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for RequestCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

/// Hands out one request code per negotiation.
///
/// Codes count up from the base and wrap to `0` after [`MAX_REQUEST_CODE`],
/// so a full cycle covers every valid code whatever the base.
#[derive(Debug, Clone)]
pub(crate) struct RequestCodes {
    next: i32,
}

impl RequestCodes {
    pub(crate) fn starting_at(base: RequestCode) -> Self {
        Self { next: base.0 }
    }

    pub(crate) fn allocate(&mut self) -> RequestCode {
        let code = RequestCode(self.next);
        self.next = if self.next >= MAX_REQUEST_CODE {
            0
        } else {
            self.next + 1
        };
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_codes_start_at_base() {
        let mut codes = RequestCodes::starting_at(RequestCode::DEFAULT);
        assert_eq!(codes.allocate(), RequestCode(123));
        assert_eq!(codes.allocate(), RequestCode(124));
        assert_eq!(codes.allocate(), RequestCode(125));
    }

    #[test]
    fn test_request_codes_wrap_to_zero() {
        let mut codes = RequestCodes::starting_at(RequestCode(MAX_REQUEST_CODE - 1));
        assert_eq!(codes.allocate(), RequestCode(MAX_REQUEST_CODE - 1));
        assert_eq!(codes.allocate(), RequestCode(MAX_REQUEST_CODE));
        assert_eq!(codes.allocate(), RequestCode(0));
        assert_eq!(codes.allocate(), RequestCode(1));
    }

    #[test]
    fn test_request_codes_from_max_base_stay_distinct() {
        let mut codes = RequestCodes::starting_at(RequestCode(MAX_REQUEST_CODE));
        let first = codes.allocate();
        let second = codes.allocate();
        assert_eq!(first, RequestCode(MAX_REQUEST_CODE));
        assert_ne!(first, second);
        assert!(second.is_valid());
    }

    #[test]
    fn test_request_code_validity() {
        assert!(RequestCode(0).is_valid());
        assert!(RequestCode::DEFAULT.is_valid());
        assert!(RequestCode(MAX_REQUEST_CODE).is_valid());
        assert!(!RequestCode(-1).is_valid());
        assert!(!RequestCode(MAX_REQUEST_CODE + 1).is_valid());
    }
}
