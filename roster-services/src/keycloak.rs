//! Identity-broker synchronizer: OIDC client provisioning and the
//! suffix-derived broker groups per team.

use std::collections::BTreeSet;

use roster_core::env::{self, Environment};
use roster_core::types::{DesiredState, Handle, Team};
use roster_engine::{
    attempt, reconcile_membership, GroupSpec, Identity, MembershipPort, MembershipTarget,
    PortError, ReconcilePolicy, Role, RunReport,
};

use crate::synchronizer::{team_banner, RunState, Synchronizer};

/// What to create when an OIDC client is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcClientSpec {
    pub client_id: String,
    pub root_url: Option<String>,
    pub redirect_uris: Vec<String>,
    pub post_logout_redirect_uris: String,
}

/// Broker-side client registry operations, layered on top of the broker's
/// membership port.
pub trait OidcClientPort {
    fn list_client_ids(&mut self) -> Result<BTreeSet<String>, PortError>;

    fn create_client(&mut self, spec: &OidcClientSpec) -> Result<(), PortError>;

    /// Client secret for an existing client, `None` when the client does
    /// not exist.
    fn client_secret(&mut self, client_id: &str) -> Result<Option<String>, PortError>;
}

impl<T: OidcClientPort + ?Sized> OidcClientPort for &mut T {
    fn list_client_ids(&mut self) -> Result<BTreeSet<String>, PortError> {
        (**self).list_client_ids()
    }

    fn create_client(&mut self, spec: &OidcClientSpec) -> Result<(), PortError> {
        (**self).create_client(spec)
    }

    fn client_secret(&mut self, client_id: &str) -> Result<Option<String>, PortError> {
        (**self).client_secret(client_id)
    }
}

/// Build the per-environment client spec from the URL conventions.
pub fn oidc_client_spec(team: &Team, env: Environment) -> OidcClientSpec {
    let slug = team.url_slug();
    match env {
        Environment::Local => OidcClientSpec {
            client_id: team.oidc_client_id(env),
            root_url: None,
            redirect_uris: vec![format!("{}/auth/callback", env::server_url(slug, env))],
            post_logout_redirect_uris: format!("{}/*", env::frontend_url(slug, env)),
        },
        _ => OidcClientSpec {
            client_id: team.oidc_client_id(env),
            root_url: Some(env::frontend_url(slug, env)),
            redirect_uris: vec![format!("{}/auth/callback", env::server_url(slug, env))],
            // Any post-logout redirect URI with the same origin.
            post_logout_redirect_uris: "/*".to_owned(),
        },
    }
}

/// Reconciles the identity broker: clients first, then the `-admins`,
/// `-devs`, `-ext-admins`, and `-applicants` groups.
pub struct KeycloakSynchronizer<'a, P> {
    port: P,
    desired: &'a DesiredState,
}

impl<'a, P> KeycloakSynchronizer<'a, P>
where
    P: MembershipPort + OidcClientPort,
{
    pub fn new(port: P, desired: &'a DesiredState) -> Self {
        Self { port, desired }
    }

    fn sync_team(
        &mut self,
        team: &Team,
        existing_clients: &mut BTreeSet<String>,
        report: &mut RunReport,
    ) {
        if team.create_oidc_clients {
            self.create_clients(team, existing_clients, report);
        } else {
            tracing::debug!(
                "team {} opted out of OIDC client creation, skipping",
                team.name
            );
        }

        // Maintainers (plus the client service accounts) into `-admins`.
        let mut admin_target = self.directory_target(team.maintainers().iter());
        if team.create_oidc_clients {
            for env in Environment::ALL {
                admin_target.insert(Identity::from(team.service_account_username(env)), Role::Member);
            }
        }
        self.sync_group(team, team.admins_group(), admin_target, report);

        // Contributors who are not maintainers into `-devs`.
        let dev_target = self.directory_target(team.plain_devs().iter());
        self.sync_group(team, team.devs_group(), dev_target, report);

        // External admins are already broker usernames; pass them through.
        if let Some(ext_admins) = &team.ext_admins {
            let target: MembershipTarget = ext_admins
                .iter()
                .map(|username| (username.as_str(), Role::Member))
                .collect();
            self.sync_group(team, team.ext_admins_group(), target, report);
        }

        if let Some(applicants) = &team.applicants {
            let target = self.directory_target(applicants.iter());
            self.sync_group(team, team.applicants_group(), target, report);
        }
    }

    fn create_clients(
        &mut self,
        team: &Team,
        existing_clients: &mut BTreeSet<String>,
        report: &mut RunReport,
    ) {
        // Load-time validation guarantees a site slug here; a missing one
        // at this point is a definition bug worth surfacing.
        if team.site_slug.is_none() {
            report.error(format!("team {} has no site-slug for its OIDC clients", team.slug));
            return;
        }

        for env in Environment::ALL {
            let spec = oidc_client_spec(team, env);
            if existing_clients.contains(&spec.client_id) {
                tracing::debug!("OIDC client {} already exists, skipping", spec.client_id);
                continue;
            }
            let what = format!("create OIDC client {}", spec.client_id);
            if attempt(report, &what, || self.port.create_client(&spec)).is_some() {
                existing_clients.insert(spec.client_id);
            }
        }
    }

    /// Map handles to broker usernames. Contributors without one are not
    /// broker users and are skipped.
    fn directory_target<'h>(&self, handles: impl Iterator<Item = &'h Handle>) -> MembershipTarget {
        let mut target = MembershipTarget::new();
        for handle in handles {
            let Some(contributor) = self.desired.contributor(handle) else {
                continue;
            };
            match &contributor.sso_username {
                Some(username) => target.insert(Identity::from(username.as_str()), Role::Member),
                None => {
                    tracing::debug!("contributor {handle} has no SSO username, skipping");
                }
            }
        }
        target
    }

    fn sync_group(
        &mut self,
        team: &Team,
        group_key: String,
        target: MembershipTarget,
        report: &mut RunReport,
    ) {
        let Some(group) = attempt(report, &format!("ensure broker group {group_key}"), || {
            self.port.ensure_group(&GroupSpec::new(group_key.clone(), group_key.clone()))
        }) else {
            return;
        };

        reconcile_membership(
            &mut self.port,
            &group,
            &target,
            ReconcilePolicy {
                remove_unlisted: team.remove_unlisted,
            },
            report,
        );
    }
}

impl<P> Synchronizer for KeycloakSynchronizer<'_, P>
where
    P: MembershipPort + OidcClientPort,
{
    fn name(&self) -> &'static str {
        "keycloak"
    }

    fn sync(&mut self, _state: &mut RunState, report: &mut RunReport) {
        let Some(mut existing_clients) = attempt(report, "list OIDC clients", || {
            self.port.list_client_ids()
        }) else {
            return;
        };

        let desired = self.desired;
        for team in desired.teams.values() {
            team_banner(team);
            self.sync_team(team, &mut existing_clients, report);
        }
    }
}
