//! Resource-grant reconciliation: the membership algorithm specialized to
//! resource identifiers with a permission level.
//!
//! Permission is re-asserted on every target resource unconditionally:
//! permission reads are costlier than blind idempotent writes on the
//! systems we talk to.

use std::collections::BTreeSet;

use crate::membership::ReconcilePolicy;
use crate::ports::{GrantPort, GroupRef, Permission, Resource};
use crate::report::{attempt, RunReport};

/// What one grant pass did to one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantOutcome {
    pub granted: Vec<Resource>,
    pub revoked: Vec<Resource>,
    pub failed: u32,
    pub removal_skipped: bool,
}

/// Reconcile the resources granted to `group` against `targets`, asserting
/// `permission` on every target resource.
pub fn reconcile_grants<P>(
    port: &mut P,
    group: &GroupRef,
    targets: &BTreeSet<Resource>,
    permission: Permission,
    policy: ReconcilePolicy,
    report: &mut RunReport,
) -> GrantOutcome
where
    P: GrantPort + ?Sized,
{
    let mut outcome = GrantOutcome::default();

    let Some(current) = attempt(report, &format!("list grants of group {}", group.name), || {
        port.list_grants(group)
    }) else {
        outcome.failed += 1;
        return outcome;
    };

    for resource in targets {
        if !current.contains(resource) {
            let what = format!("grant {resource} to group {}", group.name);
            match attempt(report, &what, || port.grant(group, resource)) {
                Some(()) => outcome.granted.push(resource.clone()),
                None => {
                    outcome.failed += 1;
                    continue;
                }
            }
        }

        let what = format!("set {permission} permission on {resource} for group {}", group.name);
        if attempt(report, &what, || port.set_permission(group, resource, permission)).is_none() {
            outcome.failed += 1;
        }
    }

    if !policy.remove_unlisted {
        tracing::debug!(
            "group {} keeps unlisted grants by policy, skipping revocation",
            group.name
        );
        outcome.removal_skipped = true;
        return outcome;
    }

    for resource in current.difference(targets) {
        let what = format!("revoke {resource} from group {}", group.name);
        match attempt(report, &what, || port.revoke(group, resource)) {
            Some(()) => outcome.revoked.push(resource.clone()),
            None => outcome.failed += 1,
        }
    }

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
