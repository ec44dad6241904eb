//! Capability classification.
//!
//! Partitions a requested set into what is already granted, what can be
//! requested silently and what needs an explanation first.

use crate::capability::Capability;
use crate::check::has_permission;
use crate::host::{PermissionHost, RuntimeGrantProbe};
use serde::Serialize;

/// Live grant state of one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    /// Usable now.
    Granted,
    /// Not granted and never declined in a way that asks for an explanation.
    DeniedSilently,
    /// Declined before; the host wants a rationale shown before asking again.
    DeniedWithRationale,
}

impl GrantState {
    pub fn is_granted(self) -> bool {
        self == GrantState::Granted
    }
}

impl std::fmt::Display for GrantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantState::Granted => write!(f, "granted"),
            GrantState::DeniedSilently => write!(f, "denied"),
            GrantState::DeniedWithRationale => write!(f, "denied (rationale owed)"),
        }
    }
}

/// Determine the grant state of a single capability from live host state.
pub fn grant_state<H, P>(host: &H, probe: &P, capability: &Capability) -> GrantState
where
    H: PermissionHost + ?Sized,
    P: RuntimeGrantProbe + ?Sized,
{
    if has_permission(host, probe, capability) {
        GrantState::Granted
    } else if host.should_show_rationale(capability) {
        GrantState::DeniedWithRationale
    } else {
        GrantState::DeniedSilently
    }
}

/// Per-entry grant states of a requested set, in request order.
///
/// Duplicated capabilities keep one entry each.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Classification {
    entries: Vec<(Capability, GrantState)>,
}

impl Classification {
    /// Entries in request order.
    pub fn entries(&self) -> &[(Capability, GrantState)] {
        &self.entries
    }

    /// State of the entry at `index` in the requested set.
    pub fn state_at(&self, index: usize) -> Option<GrantState> {
        self.entries.get(index).map(|(_, state)| *state)
    }

    /// Ungranted capabilities that can be requested without explanation.
    pub fn fresh(&self) -> Vec<Capability> {
        self.with_state(GrantState::DeniedSilently)
    }

    /// Ungranted capabilities that need a rationale before re-requesting.
    pub fn rationale(&self) -> Vec<Capability> {
        self.with_state(GrantState::DeniedWithRationale)
    }

    /// Capabilities that are already usable.
    pub fn granted(&self) -> Vec<Capability> {
        self.with_state(GrantState::Granted)
    }

    /// True when every requested capability is already granted.
    pub fn is_satisfied(&self) -> bool {
        self.entries.iter().all(|(_, state)| state.is_granted())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn with_state(&self, wanted: GrantState) -> Vec<Capability> {
        self.entries
            .iter()
            .filter(|(_, state)| *state == wanted)
            .map(|(capability, _)| capability.clone())
            .collect()
    }
}

impl FromIterator<(Capability, GrantState)> for Classification {
    fn from_iter<I: IntoIterator<Item = (Capability, GrantState)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Classify every capability in `requested` against live host state.
///
/// # Example
///
/// ```rust
/// use permit_core::capability::{READ_CONTACTS, READ_SMS, ACCESS_FINE_LOCATION};
/// use permit_core::classify::classify;
/// use permit_core::test_utils::{FakeHost, FixedProbe};
///
/// let host = FakeHost::new()
///     .with_granted(ACCESS_FINE_LOCATION)
///     .with_rationale(READ_CONTACTS);
///
/// let classification = classify(
///     &host,
///     &FixedProbe::runtime(),
///     &[ACCESS_FINE_LOCATION, READ_CONTACTS, READ_SMS],
/// );
/// assert_eq!(classification.granted(), vec![ACCESS_FINE_LOCATION]);
/// assert_eq!(classification.rationale(), vec![READ_CONTACTS]);
/// assert_eq!(classification.fresh(), vec![READ_SMS]);
/// ```
pub fn classify<H, P>(host: &H, probe: &P, requested: &[Capability]) -> Classification
where
    H: PermissionHost + ?Sized,
    P: RuntimeGrantProbe + ?Sized,
{
    requested
        .iter()
        .map(|capability| (capability.clone(), grant_state(host, probe, capability)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        ACCESS_FINE_LOCATION, READ_CALL_LOG, READ_CONTACTS, READ_SMS, WRITE_EXTERNAL_STORAGE,
    };
    use crate::test_utils::{FakeHost, FixedProbe};

    #[test]
    fn test_subsets_are_disjoint_and_ordered() {
        let host = FakeHost::new()
            .with_granted(ACCESS_FINE_LOCATION)
            .with_rationale(READ_CONTACTS)
            .with_rationale(READ_CALL_LOG);

        let requested = vec![
            READ_CALL_LOG,
            ACCESS_FINE_LOCATION,
            READ_SMS,
            READ_CONTACTS,
            WRITE_EXTERNAL_STORAGE,
        ];
        let classification = classify(&host, &FixedProbe::runtime(), &requested);

        assert_eq!(classification.len(), 5);
        assert_eq!(classification.granted(), vec![ACCESS_FINE_LOCATION]);
        assert_eq!(classification.fresh(), vec![READ_SMS, WRITE_EXTERNAL_STORAGE]);
        assert_eq!(classification.rationale(), vec![READ_CALL_LOG, READ_CONTACTS]);
        assert!(!classification.is_satisfied());
    }

    #[test]
    fn test_granted_capability_never_asks_for_rationale() {
        // Host still reports the rationale flag, but a granted capability
        // must not be routed anywhere
        let host = FakeHost::new()
            .with_granted(READ_SMS)
            .with_rationale(READ_SMS);

        let classification = classify(&host, &FixedProbe::runtime(), &[READ_SMS]);
        assert!(classification.is_satisfied());
        assert!(classification.rationale().is_empty());
        assert!(!host.rationale_queries().contains(&READ_SMS));
    }

    #[test]
    fn test_duplicates_classified_independently() {
        let host = FakeHost::new();
        let classification =
            classify(&host, &FixedProbe::runtime(), &[READ_SMS, READ_SMS, READ_SMS]);

        assert_eq!(classification.fresh(), vec![READ_SMS, READ_SMS, READ_SMS]);
    }

    #[test]
    fn test_pre_runtime_host_is_satisfied() {
        let host = FakeHost::new().with_rationale(READ_CONTACTS);
        let classification = classify(&host, &FixedProbe::legacy(), &[READ_CONTACTS, READ_SMS]);

        assert!(classification.is_satisfied());
        assert!(classification.fresh().is_empty());
        assert!(classification.rationale().is_empty());
    }

    #[test]
    fn test_reclassification_sees_live_state() {
        let host = FakeHost::new();
        let probe = FixedProbe::runtime();

        assert_eq!(
            classify(&host, &probe, &[READ_SMS]).state_at(0),
            Some(GrantState::DeniedSilently)
        );

        host.set_rationale(READ_SMS, true);
        assert_eq!(
            classify(&host, &probe, &[READ_SMS]).state_at(0),
            Some(GrantState::DeniedWithRationale)
        );

        host.grant(READ_SMS);
        assert_eq!(
            classify(&host, &probe, &[READ_SMS]).state_at(0),
            Some(GrantState::Granted)
        );
    }

    #[test]
    fn test_empty_request_is_satisfied() {
        let classification = classify(&FakeHost::new(), &FixedProbe::runtime(), &[]);
        assert!(classification.is_empty());
        assert!(classification.is_satisfied());
    }
}
