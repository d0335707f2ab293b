//! In-memory fake ports and fixture builders shared by the synchronizer
//! integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use roster_core::types::{Contributor, DesiredState, Handle, Team, TeamSlug};
use roster_engine::{
    ChannelPort, GrantPort, GroupRef, GroupSpec, Identity, MembershipPort, Permission, PortError,
    Resource, Role, SecretBundle, SecretStorePort,
};
use roster_services::keycloak::{OidcClientPort, OidcClientSpec};
use roster_services::minio::StoragePort;
use roster_services::synchronizer::StorageCredentials;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn contributor(handle: &str, slack_member_id: &str, sso_username: Option<&str>) -> Contributor {
    Contributor {
        handle: Handle::from(handle),
        full_name: format!("{handle} Example"),
        slack_member_id: slack_member_id.to_owned(),
        sso_username: sso_username.map(str::to_owned),
    }
}

pub fn team(slug: &str, leads: &[&str], devs: &[&str]) -> Team {
    Team {
        slug: TeamSlug::from(slug),
        name: slug.to_owned(),
        site_slug: Some(slug.to_owned()),
        leads: leads.iter().map(|h| Handle::from(*h)).collect(),
        devs: devs.iter().map(|h| Handle::from(*h)).collect(),
        applicants: None,
        ext_admins: None,
        repos: vec![],
        slack_channel_ids: vec![],
        remove_unlisted: true,
        create_oidc_clients: true,
        sync_github: true,
        sync_minio: true,
        secrets_layout: roster_core::types::SecretsLayout::Multi,
        aggregate_maintainers: false,
    }
}

pub fn desired_state(contributors: Vec<Contributor>, teams: Vec<Team>) -> DesiredState {
    DesiredState {
        contributors: contributors
            .into_iter()
            .map(|c| (c.handle.clone(), c))
            .collect(),
        teams: teams.into_iter().map(|t| (t.slug.clone(), t)).collect(),
    }
}

// ---------------------------------------------------------------------------
// FakeHub — source-control host (membership + grants)
// ---------------------------------------------------------------------------

/// In-memory GitHub-shaped system. Every mutating call lands in `ops` so
/// tests can assert cross-pass ordering.
#[derive(Debug, Default)]
pub struct FakeHub {
    pub members: BTreeMap<String, BTreeMap<Identity, Role>>,
    pub pending: BTreeMap<String, BTreeSet<Identity>>,
    pub grants: BTreeMap<String, BTreeSet<Resource>>,
    pub protected: BTreeSet<Identity>,
    pub created_groups: Vec<String>,
    pub fail_adds: BTreeSet<Identity>,
    pub ops: Vec<String>,
}

impl FakeHub {
    pub fn live_members(&self, group: &str) -> BTreeSet<Identity> {
        self.members
            .get(group)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn op_index(&self, op: &str) -> Option<usize> {
        self.ops.iter().position(|o| o == op)
    }
}

impl MembershipPort for FakeHub {
    fn ensure_group(&mut self, spec: &GroupSpec) -> Result<GroupRef, PortError> {
        if !self.members.contains_key(&spec.key) {
            self.members.insert(spec.key.clone(), BTreeMap::new());
            self.created_groups.push(spec.key.clone());
        }
        Ok(GroupRef {
            key: spec.key.clone(),
            name: spec.name.clone(),
        })
    }

    fn list_members(&mut self, group: &GroupRef) -> Result<BTreeMap<Identity, Role>, PortError> {
        Ok(self.members.get(&group.key).cloned().unwrap_or_default())
    }

    fn list_pending_invitations(&mut self, group: &GroupRef) -> Result<BTreeSet<Identity>, PortError> {
        Ok(self.pending.get(&group.key).cloned().unwrap_or_default())
    }

    fn add_member(
        &mut self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> Result<(), PortError> {
        if self.fail_adds.contains(identity) {
            return Err(PortError::UnknownIdentity(identity.0.clone()));
        }
        self.ops.push(format!("add:{}:{identity}", group.key));
        self.members
            .entry(group.key.clone())
            .or_default()
            .insert(identity.clone(), role);
        Ok(())
    }

    fn remove_member(&mut self, group: &GroupRef, identity: &Identity) -> Result<(), PortError> {
        self.ops.push(format!("remove:{}:{identity}", group.key));
        self.members
            .entry(group.key.clone())
            .or_default()
            .remove(identity);
        Ok(())
    }

    fn protected_identities(&mut self) -> Result<BTreeSet<Identity>, PortError> {
        Ok(self.protected.clone())
    }
}

impl GrantPort for FakeHub {
    fn list_grants(&mut self, group: &GroupRef) -> Result<BTreeSet<Resource>, PortError> {
        Ok(self.grants.get(&group.key).cloned().unwrap_or_default())
    }

    fn grant(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError> {
        self.ops.push(format!("grant:{}:{resource}", group.key));
        self.grants
            .entry(group.key.clone())
            .or_default()
            .insert(resource.clone());
        Ok(())
    }

    fn set_permission(
        &mut self,
        group: &GroupRef,
        resource: &Resource,
        permission: Permission,
    ) -> Result<(), PortError> {
        self.ops
            .push(format!("perm:{}:{resource}:{permission}", group.key));
        Ok(())
    }

    fn revoke(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError> {
        self.ops.push(format!("revoke:{}:{resource}", group.key));
        self.grants
            .entry(group.key.clone())
            .or_default()
            .remove(resource);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeBroker — identity broker (membership + OIDC clients)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeBroker {
    pub members: BTreeMap<String, BTreeMap<Identity, Role>>,
    pub clients: BTreeMap<String, String>,
    pub created_clients: Vec<OidcClientSpec>,
    pub created_groups: Vec<String>,
    pub ops: Vec<String>,
}

impl FakeBroker {
    /// Seed a client with a known secret, as if provisioned on an earlier
    /// run.
    pub fn with_client(mut self, client_id: &str, secret: &str) -> Self {
        self.clients.insert(client_id.to_owned(), secret.to_owned());
        self
    }

    pub fn live_members(&self, group: &str) -> BTreeSet<Identity> {
        self.members
            .get(group)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl MembershipPort for FakeBroker {
    fn ensure_group(&mut self, spec: &GroupSpec) -> Result<GroupRef, PortError> {
        if !self.members.contains_key(&spec.key) {
            self.members.insert(spec.key.clone(), BTreeMap::new());
            self.created_groups.push(spec.key.clone());
        }
        Ok(GroupRef {
            key: spec.key.clone(),
            name: spec.name.clone(),
        })
    }

    fn list_members(&mut self, group: &GroupRef) -> Result<BTreeMap<Identity, Role>, PortError> {
        Ok(self.members.get(&group.key).cloned().unwrap_or_default())
    }

    fn add_member(
        &mut self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> Result<(), PortError> {
        self.ops.push(format!("add:{}:{identity}", group.key));
        self.members
            .entry(group.key.clone())
            .or_default()
            .insert(identity.clone(), role);
        Ok(())
    }

    fn remove_member(&mut self, group: &GroupRef, identity: &Identity) -> Result<(), PortError> {
        self.ops.push(format!("remove:{}:{identity}", group.key));
        self.members
            .entry(group.key.clone())
            .or_default()
            .remove(identity);
        Ok(())
    }
}

impl OidcClientPort for FakeBroker {
    fn list_client_ids(&mut self) -> Result<BTreeSet<String>, PortError> {
        Ok(self.clients.keys().cloned().collect())
    }

    fn create_client(&mut self, spec: &OidcClientSpec) -> Result<(), PortError> {
        self.clients
            .insert(spec.client_id.clone(), format!("secret-{}", spec.client_id));
        self.created_clients.push(spec.clone());
        Ok(())
    }

    fn client_secret(&mut self, client_id: &str) -> Result<Option<String>, PortError> {
        Ok(self.clients.get(client_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// FakeVault — secret store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeVault {
    pub bundles: BTreeMap<String, SecretBundle>,
    pub writes: u32,
}

impl SecretStorePort for FakeVault {
    fn any_secrets_under(&mut self, prefix: &str) -> Result<bool, PortError> {
        let nested = format!("{prefix}/");
        Ok(self
            .bundles
            .keys()
            .any(|path| path == prefix || path.starts_with(&nested)))
    }

    fn write_bundle(&mut self, path: &str, bundle: &SecretBundle) -> Result<(), PortError> {
        self.writes += 1;
        self.bundles.insert(path.to_owned(), bundle.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeChat — chat channels
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeChat {
    pub channels: BTreeSet<String>,
    pub joined: BTreeSet<String>,
    pub members: BTreeMap<String, BTreeSet<Identity>>,
    pub invites: Vec<(String, Vec<Identity>)>,
}

impl FakeChat {
    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channels.insert(channel.to_owned());
        self
    }
}

impl ChannelPort for FakeChat {
    fn channel_is_joined(&mut self, channel: &str) -> Result<bool, PortError> {
        if !self.channels.contains(channel) {
            return Err(PortError::UnknownGroup(channel.to_owned()));
        }
        Ok(self.joined.contains(channel))
    }

    fn join_channel(&mut self, channel: &str) -> Result<(), PortError> {
        self.joined.insert(channel.to_owned());
        Ok(())
    }

    fn list_channel_members(&mut self, channel: &str) -> Result<BTreeSet<Identity>, PortError> {
        Ok(self.members.get(channel).cloned().unwrap_or_default())
    }

    fn invite_to_channel(
        &mut self,
        channel: &str,
        identities: &[Identity],
    ) -> Result<(), PortError> {
        self.invites
            .push((channel.to_owned(), identities.to_vec()));
        self.members
            .entry(channel.to_owned())
            .or_default()
            .extend(identities.iter().cloned());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeStorage — object store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeStorage {
    pub buckets: BTreeSet<String>,
    pub accounts: BTreeSet<String>,
    pub created_buckets: Vec<String>,
    pub created_accounts: Vec<String>,
    counter: u32,
}

impl StoragePort for FakeStorage {
    fn list_buckets(&mut self) -> Result<BTreeSet<String>, PortError> {
        Ok(self.buckets.clone())
    }

    fn create_bucket(&mut self, name: &str) -> Result<(), PortError> {
        self.buckets.insert(name.to_owned());
        self.created_buckets.push(name.to_owned());
        Ok(())
    }

    fn list_service_accounts(&mut self) -> Result<BTreeSet<String>, PortError> {
        Ok(self.accounts.clone())
    }

    fn create_service_account(
        &mut self,
        name: &str,
        _description: &str,
        _policy: &serde_json::Value,
    ) -> Result<StorageCredentials, PortError> {
        self.counter += 1;
        self.accounts.insert(name.to_owned());
        self.created_accounts.push(name.to_owned());
        Ok(StorageCredentials {
            access_key: format!("AK{:04}", self.counter),
            secret_key: format!("SK{:04}", self.counter),
        })
    }
}
