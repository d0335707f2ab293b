//! Role-aware set reconciliation for one membership group.
//!
//! The reconciler re-derives its diff from live state on every run, so a
//! failed operation is simply retried by the next scheduled run; there is
//! no in-process retry.

use std::collections::{btree_map, BTreeMap};

use crate::ports::{GroupRef, Identity, MembershipPort, Role};
use crate::report::{attempt, RunReport};

/// Desired membership of one group: identity → role.
///
/// When the same identity is inserted twice the higher role wins, so a
/// target assembled from overlapping role lists never demotes anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipTarget {
    entries: BTreeMap<Identity, Role>,
}

impl MembershipTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: Identity, role: Role) {
        match self.entries.entry(identity) {
            btree_map::Entry::Vacant(e) => {
                e.insert(role);
            }
            btree_map::Entry::Occupied(mut e) => {
                if role > *e.get() {
                    e.insert(role);
                }
            }
        }
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &Role)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: Into<Identity>> FromIterator<(I, Role)> for MembershipTarget {
    fn from_iter<T: IntoIterator<Item = (I, Role)>>(iter: T) -> Self {
        let mut target = Self::new();
        for (identity, role) in iter {
            target.insert(identity.into(), role);
        }
        target
    }
}

/// Per-group reconciliation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// When false, members absent from the target are left alone and the
    /// removal step is skipped entirely.
    pub remove_unlisted: bool,
}

/// What one reconciliation pass did to one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub added: Vec<Identity>,
    pub updated: Vec<Identity>,
    pub removed: Vec<Identity>,
    /// Operations that failed and were skipped past.
    pub failed: u32,
    /// True when the removal step was skipped by policy.
    pub removal_skipped: bool,
}

impl GroupOutcome {
    /// True when the pass issued no write at all.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile one group to `target`.
///
/// 1. List current members and pending invitations.
/// 2. Add `target − current − pending`. A pending identity is never
///    re-invited, even if its eventual role will differ; the role is
///    corrected on a later run once the invitation is accepted.
/// 3. Re-add (role update) members whose current role differs from the
///    target role.
/// 4. When `remove_unlisted`, remove `current − target`.
///
/// Protected identities are excluded from role updates and removals.
/// Failures are isolated per identity; a listing failure aborts only this
/// group's pass.
pub fn reconcile_membership<P>(
    port: &mut P,
    group: &GroupRef,
    target: &MembershipTarget,
    policy: ReconcilePolicy,
    report: &mut RunReport,
) -> GroupOutcome
where
    P: MembershipPort + ?Sized,
{
    let mut outcome = GroupOutcome::default();

    let Some(current) = attempt(report, &format!("list members of group {}", group.name), || {
        port.list_members(group)
    }) else {
        outcome.failed += 1;
        return outcome;
    };
    let Some(pending) = attempt(
        report,
        &format!("list pending invitations for group {}", group.name),
        || port.list_pending_invitations(group),
    ) else {
        outcome.failed += 1;
        return outcome;
    };
    let Some(protected) = attempt(report, "list protected identities", || {
        port.protected_identities()
    }) else {
        outcome.failed += 1;
        return outcome;
    };

    tracing::debug!(
        "group {}: {} current, {} pending, {} desired",
        group.name,
        current.len(),
        pending.len(),
        target.len()
    );

    for (identity, role) in target.iter() {
        if pending.contains(identity) {
            continue;
        }
        match current.get(identity) {
            None => {
                let what = format!("add {identity} to group {} as {role}", group.name);
                match attempt(report, &what, || port.add_member(group, identity, *role)) {
                    Some(()) => outcome.added.push(identity.clone()),
                    None => outcome.failed += 1,
                }
            }
            Some(current_role) if current_role != role && !protected.contains(identity) => {
                let what = format!("update {identity} in group {} to {role}", group.name);
                match attempt(report, &what, || port.add_member(group, identity, *role)) {
                    Some(()) => outcome.updated.push(identity.clone()),
                    None => outcome.failed += 1,
                }
            }
            Some(_) => {}
        }
    }

    if !policy.remove_unlisted {
        tracing::debug!(
            "group {} keeps unlisted members by policy, skipping removal",
            group.name
        );
        outcome.removal_skipped = true;
        return outcome;
    }

    for identity in current.keys() {
        if target.contains(identity) || protected.contains(identity) {
            continue;
        }
        let what = format!("remove {identity} from group {}", group.name);
        match attempt(report, &what, || port.remove_member(group, identity)) {
            Some(()) => outcome.removed.push(identity.clone()),
            None => outcome.failed += 1,
        }
    }

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
