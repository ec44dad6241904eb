//! Single-capability grant lookup.

use crate::capability::Capability;
use crate::host::{OpMode, PermissionHost, RuntimeGrantProbe};

/// Check whether one capability is currently usable.
///
/// Two gates are consulted. The app-op gate can be revoked without touching
/// the declared permission, so checking only the declared permission would
/// miss some denials:
///
/// 1. Hosts that do not enforce runtime grants always answer `true`.
/// 2. A capability with no host operation is treated as not granted.
/// 3. An `Ignored` op gate means not granted.
/// 4. Otherwise the declared-permission check decides.
///
/// # Example
///
/// ```rust
/// use permit_core::capability::READ_SMS;
/// use permit_core::check::has_permission;
/// use permit_core::host::{ApiLevelProbe, OpMode};
/// use permit_core::test_utils::FakeHost;
///
/// let host = FakeHost::new().with_granted(READ_SMS);
/// assert!(has_permission(&host, &ApiLevelProbe::new(30), &READ_SMS));
///
/// let host = FakeHost::new()
///     .with_granted(READ_SMS)
///     .with_op_mode(READ_SMS, OpMode::Ignored);
/// assert!(!has_permission(&host, &ApiLevelProbe::new(30), &READ_SMS));
/// ```
pub fn has_permission<H, P>(host: &H, probe: &P, capability: &Capability) -> bool
where
    H: PermissionHost + ?Sized,
    P: RuntimeGrantProbe + ?Sized,
{
    if !probe.enforces_runtime_grants() {
        return true;
    }

    let Some(op) = host.permission_to_op(capability).filter(|op| !op.is_empty()) else {
        log::debug!("no host operation for {}, treating as not granted", capability);
        return false;
    };

    if host.note_proxy_op(&op, host.package_name()) == OpMode::Ignored {
        log::debug!("op {} ignored for {}", op, capability);
        return false;
    }

    host.check_self_permission(capability).is_granted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{READ_CONTACTS, READ_SMS};
    use crate::host::ApiLevelProbe;
    use crate::test_utils::{FakeHost, FixedProbe};

    #[test]
    fn test_pre_runtime_host_always_grants() {
        // Nothing granted, op ignored, no op mapping: all irrelevant below level 23
        let host = FakeHost::new()
            .with_op_mode(READ_SMS, OpMode::Ignored)
            .without_op(READ_CONTACTS);

        assert!(has_permission(&host, &ApiLevelProbe::new(22), &READ_SMS));
        assert!(has_permission(&host, &ApiLevelProbe::new(22), &READ_CONTACTS));
        assert!(host.queries().is_empty());
    }

    #[test]
    fn test_declared_grant_is_enough_when_op_allowed() {
        let host = FakeHost::new().with_granted(READ_SMS);
        assert!(has_permission(&host, &FixedProbe::runtime(), &READ_SMS));
    }

    #[test]
    fn test_ungranted_declared_permission() {
        let host = FakeHost::new();
        assert!(!has_permission(&host, &FixedProbe::runtime(), &READ_SMS));
    }

    #[test]
    fn test_ignored_op_overrides_declared_grant() {
        let host = FakeHost::new()
            .with_granted(READ_SMS)
            .with_op_mode(READ_SMS, OpMode::Ignored);
        assert!(!has_permission(&host, &FixedProbe::runtime(), &READ_SMS));
    }

    #[test]
    fn test_other_op_modes_defer_to_declared_permission() {
        for mode in [OpMode::Allowed, OpMode::Default, OpMode::Errored] {
            let host = FakeHost::new()
                .with_granted(READ_SMS)
                .with_op_mode(READ_SMS, mode);
            assert!(
                has_permission(&host, &FixedProbe::runtime(), &READ_SMS),
                "mode {:?}",
                mode
            );
        }
    }

    #[test]
    fn test_missing_op_is_not_granted() {
        let host = FakeHost::new().with_granted(READ_SMS).without_op(READ_SMS);
        assert!(!has_permission(&host, &FixedProbe::runtime(), &READ_SMS));
    }

    #[test]
    fn test_op_noted_for_host_package() {
        let host = FakeHost::new()
            .with_package("com.example.app")
            .with_granted(READ_SMS);
        has_permission(&host, &FixedProbe::runtime(), &READ_SMS);

        assert_eq!(
            host.noted_ops(),
            vec![(READ_SMS.as_str().to_string(), "com.example.app".to_string())]
        );
    }

    #[test]
    fn test_op_modes_do_not_leak_across_namespaces() {
        let vendor = Capability::new("com.vendor.permission.READ_SMS");
        let host = FakeHost::new()
            .with_granted(READ_SMS)
            .with_granted(vendor.clone())
            .with_op_mode(vendor.clone(), OpMode::Ignored);

        assert!(has_permission(&host, &FixedProbe::runtime(), &READ_SMS));
        assert!(!has_permission(&host, &FixedProbe::runtime(), &vendor));
    }
}
