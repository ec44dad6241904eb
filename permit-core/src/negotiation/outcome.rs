//! Negotiation outcomes and the callback that receives them.

use super::RequestCode;
use crate::capability::{Capability, GrantResult};
use crate::classify::{Classification, GrantState};
use serde::Serialize;
use tokio::sync::oneshot;

/// Which negotiation path produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomePath {
    /// Everything was granted; nothing was asked.
    AlreadyGranted,
    /// The user declined the rationale prompt; nothing was asked.
    RationaleDeclined,
    /// The host answered a request for never-declined capabilities.
    FreshRequest,
    /// The host answered a request made after the rationale prompt.
    RationaleRequest,
}

impl OutcomePath {
    /// True when the outcome carries an answer from the host dialog.
    pub fn is_host_result(self) -> bool {
        matches!(self, OutcomePath::FreshRequest | OutcomePath::RationaleRequest)
    }
}

/// Everything the callback learns about a finished negotiation.
///
/// `asked` and `results` are what the host reported, verbatim and aligned with
/// each other. On the paths that never reach the host, `asked` is the whole
/// requested set and `results` the synthesized codes. Use
/// [`Outcome::result_vector`] for a view aligned with the requested set.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    request_code: RequestCode,
    asked: Vec<Capability>,
    results: Vec<GrantResult>,
    requested: Vec<Capability>,
    path: OutcomePath,
    classification: Classification,
}

impl Outcome {
    pub(crate) fn new(
        request_code: RequestCode,
        asked: Vec<Capability>,
        results: Vec<GrantResult>,
        requested: Vec<Capability>,
        path: OutcomePath,
        classification: Classification,
    ) -> Self {
        Self {
            request_code,
            asked,
            results,
            requested,
            path,
            classification,
        }
    }

    pub fn request_code(&self) -> RequestCode {
        self.request_code
    }

    /// Capabilities actually asked of the host in this round.
    pub fn asked(&self) -> &[Capability] {
        &self.asked
    }

    /// Results aligned with [`Outcome::asked`].
    pub fn results(&self) -> &[GrantResult] {
        &self.results
    }

    /// Raw numeric results aligned with [`Outcome::asked`].
    pub fn result_codes(&self) -> Vec<i32> {
        self.results.iter().map(|r| r.code()).collect()
    }

    /// The full requested set.
    pub fn requested(&self) -> &[Capability] {
        &self.requested
    }

    pub fn path(&self) -> OutcomePath {
        self.path
    }

    /// Classification taken when the negotiation started.
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Results mapped back onto the full requested set, by position.
    ///
    /// An entry asked in this round takes the reported result; repeated
    /// capabilities consume reported entries in order, and a missing report
    /// counts as denied. An entry that was not asked keeps its state from
    /// classification: granted stays granted, anything else is denied.
    pub fn result_vector(&self) -> ResultVector {
        let mut used = vec![false; self.asked.len()];

        self.requested
            .iter()
            .enumerate()
            .map(|(index, capability)| {
                let reported = (0..self.asked.len())
                    .find(|&slot| !used[slot] && self.asked[slot] == *capability);

                let result = match reported {
                    Some(slot) => {
                        used[slot] = true;
                        self.results.get(slot).copied().unwrap_or(GrantResult::Denied)
                    }
                    None => match self.classification.state_at(index) {
                        Some(GrantState::Granted) => GrantResult::Granted,
                        _ => GrantResult::Denied,
                    },
                };

                (capability.clone(), result)
            })
            .collect()
    }
}

/// Capability/result pairs aligned 1:1 with a requested set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResultVector {
    entries: Vec<(Capability, GrantResult)>,
}

impl ResultVector {
    pub fn entries(&self) -> &[(Capability, GrantResult)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Capability, GrantResult)> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&(Capability, GrantResult)> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.entries.iter().map(|(c, _)| c.clone()).collect()
    }

    /// Numeric codes (`0` granted, `-1` denied) in request order.
    pub fn codes(&self) -> Vec<i32> {
        self.entries.iter().map(|(_, r)| r.code()).collect()
    }

    pub fn all_granted(&self) -> bool {
        self.entries.iter().all(|(_, r)| r.is_granted())
    }

    /// Capabilities reported denied, in request order.
    pub fn denied(&self) -> Vec<Capability> {
        self.entries
            .iter()
            .filter(|(_, r)| !r.is_granted())
            .map(|(c, _)| c.clone())
            .collect()
    }
}

impl FromIterator<(Capability, GrantResult)> for ResultVector {
    fn from_iter<I: IntoIterator<Item = (Capability, GrantResult)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultVector {
    type Item = &'a (Capability, GrantResult);
    type IntoIter = std::slice::Iter<'a, (Capability, GrantResult)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Receives the outcome of one negotiation.
///
/// The callback is consumed when it fires, so it can only ever run once.
/// Closures taking an [`Outcome`] implement this trait.
///
/// # Example
///
/// ```rust
/// use permit_core::negotiation::{Outcome, PermissionGrant};
///
/// struct Logger;
///
/// impl PermissionGrant for Logger {
///     fn on_permission_granted(self: Box<Self>, outcome: Outcome) {
///         println!("denied: {:?}", outcome.result_vector().denied());
///     }
/// }
/// ```
pub trait PermissionGrant {
    fn on_permission_granted(self: Box<Self>, outcome: Outcome);
}

/// Blanket implementation for closures
impl<F> PermissionGrant for F
where
    F: FnOnce(Outcome),
{
    fn on_permission_granted(self: Box<Self>, outcome: Outcome) {
        (*self)(outcome)
    }
}

/// Sending half of [`outcome_channel`].
#[derive(Debug)]
pub struct OutcomeSender(oneshot::Sender<Outcome>);

/// Receiving half of [`outcome_channel`]. Resolves to an error if the
/// negotiation is dropped before it finishes.
pub type OutcomeReceiver = oneshot::Receiver<Outcome>;

impl PermissionGrant for OutcomeSender {
    fn on_permission_granted(self: Box<Self>, outcome: Outcome) {
        if self.0.send(outcome).is_err() {
            log::debug!("outcome receiver dropped before delivery");
        }
    }
}

/// Create a callback whose outcome can be awaited.
///
/// # Example
///
/// ```rust
/// use permit_core::capability::READ_SMS;
/// use permit_core::negotiation::{outcome_channel, Negotiator};
/// use permit_core::test_utils::{FakeHost, FixedProbe, ScriptedPrompter};
///
/// # tokio_test::block_on(async {
/// let host = FakeHost::new().with_granted(READ_SMS);
/// let mut negotiator = Negotiator::new(host, FixedProbe::runtime(), ScriptedPrompter::new());
///
/// let (tx, rx) = outcome_channel();
/// let _negotiation = negotiator.request_multi_permissions(vec![READ_SMS], tx);
///
/// let outcome = rx.await.unwrap();
/// assert_eq!(outcome.result_vector().codes(), vec![0]);
/// # });
/// ```
pub fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    let (tx, rx) = oneshot::channel();
    (OutcomeSender(tx), rx)
}
