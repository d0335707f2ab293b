//! Domain types for the roster desired-state model.
//!
//! A [`Handle`] is the unique contributor key (also the source-control
//! username); a [`TeamSlug`] is the primary key every external resource name
//! is derived from (`<slug>-admins`, `<slug>-devs`, bucket names, OIDC
//! client IDs, secret paths).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::env::Environment;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed contributor handle (the source-control username).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub String);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Handle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed team slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamSlug(pub String);

impl fmt::Display for TeamSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TeamSlug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TeamSlug {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Secret population shape for a team (see the secrets synchronizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretsLayout {
    /// One flat bundle per environment.
    Single,
    /// Split bundles per environment (one web-facing, one server-facing).
    #[default]
    Multi,
    /// No secrets population for this team.
    None,
}

impl fmt::Display for SecretsLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretsLayout::Single => write!(f, "single"),
            SecretsLayout::Multi => write!(f, "multi"),
            SecretsLayout::None => write!(f, "none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A contributor, loaded once and read-only for the rest of a run.
///
/// The handle comes from the definition file stem, not from the document
/// body, so it cannot drift from the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Contributor {
    #[serde(skip)]
    pub handle: Handle,
    pub full_name: String,
    /// Chat platform member ID (e.g. `U0123ABCD`).
    pub slack_member_id: String,
    /// Identity-broker username. Contributors without one are skipped by
    /// broker group passes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_username: Option<String>,
}

/// A team definition with its role lists, resources, and policy flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Team {
    pub slug: TeamSlug,
    /// Display name; also the external main-team name.
    pub name: String,
    /// Identifier used in website URLs; required when `create_oidc_clients`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_slug: Option<String>,
    /// Handles of the team maintainers.
    pub leads: Vec<Handle>,
    /// Handles of the team developers.
    pub devs: Vec<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicants: Option<Vec<Handle>>,
    /// Broker usernames of external admins. These are outsiders, not
    /// contributor handles, and are passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_admins: Option<Vec<String>>,
    /// Repositories granted to the team, `<owner>/<repo>`.
    pub repos: Vec<String>,
    #[serde(default)]
    pub slack_channel_ids: Vec<String>,
    /// Whether entities absent from the desired state are removed or left
    /// alone.
    #[serde(default = "default_true")]
    pub remove_unlisted: bool,
    #[serde(default = "default_true")]
    pub create_oidc_clients: bool,
    #[serde(default = "default_true")]
    pub sync_github: bool,
    #[serde(default = "default_true")]
    pub sync_minio: bool,
    #[serde(default)]
    pub secrets_layout: SecretsLayout,
    /// When true, every other team's maintainers are unioned into this
    /// team's contributor set for the source-control main-team pass
    /// (governance-team semantics).
    #[serde(default)]
    pub aggregate_maintainers: bool,
}

fn default_true() -> bool {
    true
}

impl Team {
    /// Maintainers of the team (the leads).
    pub fn maintainers(&self) -> BTreeSet<Handle> {
        self.leads.iter().cloned().collect()
    }

    /// All contributors. Maintainers are always contributors too.
    pub fn contributors(&self) -> BTreeSet<Handle> {
        self.leads.iter().chain(self.devs.iter()).cloned().collect()
    }

    /// Developers who are not maintainers.
    pub fn plain_devs(&self) -> BTreeSet<Handle> {
        let maintainers = self.maintainers();
        self.devs
            .iter()
            .filter(|h| !maintainers.contains(h))
            .cloned()
            .collect()
    }

    /// Contributor set for the main-group pass, with the
    /// `aggregate_maintainers` policy applied against the full team map.
    pub fn assembled_contributors(&self, all_teams: &BTreeMap<TeamSlug, Team>) -> BTreeSet<Handle> {
        let mut contributors = self.contributors();
        if self.aggregate_maintainers {
            for (slug, team) in all_teams {
                if *slug != self.slug {
                    contributors.extend(team.maintainers());
                }
            }
        }
        contributors
    }

    /// `<slug>-admins`
    pub fn admins_group(&self) -> String {
        format!("{}-admins", self.slug)
    }

    /// `<slug>-devs`
    pub fn devs_group(&self) -> String {
        format!("{}-devs", self.slug)
    }

    /// `<slug>-ext-admins`
    pub fn ext_admins_group(&self) -> String {
        format!("{}-ext-admins", self.slug)
    }

    /// `<slug>-applicants`
    pub fn applicants_group(&self) -> String {
        format!("{}-applicants", self.slug)
    }

    /// `<name> Admins` — display name of the subordinate admin team.
    pub fn admin_team_name(&self) -> String {
        format!("{} Admins", self.name)
    }

    /// `service-account-<slug>-<env>` — broker username of the service
    /// account backing the `<slug>-<env>` OIDC client.
    pub fn service_account_username(&self, env: Environment) -> String {
        format!("service-account-{}-{}", self.slug, env)
    }

    /// `<slug>-<env>` — OIDC client ID for one environment.
    pub fn oidc_client_id(&self, env: Environment) -> String {
        format!("{}-{}", self.slug, env)
    }

    /// Slug used by URL conventions: the site slug when set, the team slug
    /// otherwise.
    pub fn url_slug(&self) -> &str {
        self.site_slug.as_deref().unwrap_or(&self.slug.0)
    }
}

/// The loaded, validated desired state: read-only for the rest of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub contributors: BTreeMap<Handle, Contributor>,
    pub teams: BTreeMap<TeamSlug, Team>,
}

impl DesiredState {
    pub fn contributor(&self, handle: &Handle) -> Option<&Contributor> {
        self.contributors.get(handle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
