//! Source-control hosting synchronizer: organization membership, the
//! main/admin team pair per team, and repository grants.

use std::collections::BTreeSet;

use roster_core::types::{DesiredState, Team};
use roster_engine::{
    attempt, reconcile_grants, reconcile_membership, GrantPort, GroupSpec, Identity,
    MembershipPort, MembershipTarget, Permission, ReconcilePolicy, Resource, Role, RunReport,
};

use crate::synchronizer::{team_banner, RunState, Synchronizer};

/// Well-known group key the port resolves to the organization itself.
pub const ORG_GROUP_KEY: &str = "@org";

/// Reconciles the source-control host: one org-wide membership pass, then
/// per team a main team, an admin sub-team, and the repository grants.
pub struct GithubSynchronizer<'a, P> {
    port: P,
    desired: &'a DesiredState,
}

impl<'a, P> GithubSynchronizer<'a, P>
where
    P: MembershipPort + GrantPort,
{
    pub fn new(port: P, desired: &'a DesiredState) -> Self {
        Self { port, desired }
    }

    /// Invite every contributor to the organization. Add-only: nobody is
    /// ever removed from the org here, and org owners are protected from
    /// role changes by the port.
    fn sync_org_membership(&mut self, report: &mut RunReport) {
        let Some(org) = attempt(report, "resolve the organization", || {
            self.port.ensure_group(&GroupSpec::new(ORG_GROUP_KEY, "organization"))
        }) else {
            return;
        };

        let target: MembershipTarget = self
            .desired
            .contributors
            .keys()
            .map(|handle| (handle.0.as_str(), Role::Member))
            .collect();

        reconcile_membership(
            &mut self.port,
            &org,
            &target,
            ReconcilePolicy {
                remove_unlisted: false,
            },
            report,
        );
    }

    fn sync_team(&mut self, team: &Team, report: &mut RunReport) {
        if !team.sync_github {
            tracing::debug!("team {} opted out of GitHub sync, skipping", team.name);
            return;
        }

        let Some(main) = attempt(report, &format!("ensure GitHub team {}", team.name), || {
            self.port.ensure_group(&GroupSpec::new(team.slug.0.clone(), team.name.clone()))
        }) else {
            return;
        };
        let Some(admin) = attempt(
            report,
            &format!("ensure GitHub team {}", team.admin_team_name()),
            || {
                self.port.ensure_group(&GroupSpec::child_of(
                    team.admins_group(),
                    team.admin_team_name(),
                    main.clone(),
                ))
            },
        ) else {
            return;
        };

        let policy = ReconcilePolicy {
            remove_unlisted: team.remove_unlisted,
        };

        let main_target = self.main_target(team);
        let admin_target = self.admin_target(team);

        // Admin-team membership implies main-team membership, so the base
        // team is reconciled before the subordinate team.
        reconcile_membership(&mut self.port, &main, &main_target, policy, report);
        reconcile_membership(&mut self.port, &admin, &admin_target, policy, report);

        let repos: BTreeSet<Resource> = team.repos.iter().map(|r| Resource::from(r.as_str())).collect();
        reconcile_grants(&mut self.port, &main, &repos, Permission::Write, policy, report);
        reconcile_grants(&mut self.port, &admin, &repos, Permission::Admin, policy, report);
    }

    /// Main-team target: maintainers as maintainers, everyone else in the
    /// (possibly aggregated) contributor set as member.
    fn main_target(&self, team: &Team) -> MembershipTarget {
        let maintainers = team.maintainers();
        let mut target = MembershipTarget::new();
        for handle in &maintainers {
            target.insert(Identity::from(handle.0.as_str()), Role::Maintainer);
        }
        for handle in team.assembled_contributors(&self.desired.teams) {
            if !maintainers.contains(&handle) {
                target.insert(Identity::from(handle.0.as_str()), Role::Member);
            }
        }
        target
    }

    fn admin_target(&self, team: &Team) -> MembershipTarget {
        team.maintainers()
            .into_iter()
            .map(|handle| (handle.0, Role::Maintainer))
            .collect()
    }
}

impl<P> Synchronizer for GithubSynchronizer<'_, P>
where
    P: MembershipPort + GrantPort,
{
    fn name(&self) -> &'static str {
        "github"
    }

    fn sync(&mut self, _state: &mut RunState, report: &mut RunReport) {
        self.sync_org_membership(report);
        let desired = self.desired;
        for team in desired.teams.values() {
            team_banner(team);
            self.sync_team(team, report);
        }
    }
}
