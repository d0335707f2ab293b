//! Capability ports — the narrow contracts external systems must satisfy.
//!
//! Every side effect of a reconciliation run goes through one of these
//! traits; nothing else in the engine or the synchronizers touches network
//! state. Adapters live at the binary boundary, fakes live in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::PortError;

// ---------------------------------------------------------------------------
// Wire-level value types
// ---------------------------------------------------------------------------

/// An external identity as the target system names it (a login, a directory
/// username, a chat member ID).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(pub String);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A grantable resource identifier (e.g. `<owner>/<repo>`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resource(pub String);

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Membership role within a group. Ordered so the higher role wins when a
/// target is assembled from overlapping lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Member,
    Maintainer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Member => write!(f, "member"),
            Role::Maintainer => write!(f, "maintainer"),
        }
    }
}

/// Permission level for a resource grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Read,
    Write,
    Admin,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
            Permission::Admin => write!(f, "admin"),
        }
    }
}

/// Handle to an existing group on the external system.
///
/// The `key` is the stable derived name (`<slug>-admins`, a team slug, …);
/// ports map it to whatever native ID their system uses internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub key: String,
    pub name: String,
}

/// What to create when a group does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub key: String,
    pub name: String,
    /// Subordinate groups are created under a parent (e.g. an admin
    /// sub-team layered on the main team).
    pub parent: Option<GroupRef>,
}

impl GroupSpec {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent: None,
        }
    }

    pub fn child_of(key: impl Into<String>, name: impl Into<String>, parent: GroupRef) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent: Some(parent),
        }
    }
}

/// A flat key/value secret bundle.
pub type SecretBundle = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Port traits
// ---------------------------------------------------------------------------

/// Membership-group operations.
pub trait MembershipPort {
    /// Idempotently create the group if absent and return a handle to it.
    fn ensure_group(&mut self, spec: &GroupSpec) -> Result<GroupRef, PortError>;

    /// Current accepted members with their roles.
    fn list_members(&mut self, group: &GroupRef) -> Result<BTreeMap<Identity, Role>, PortError>;

    /// Identities invited but not yet accepted. Systems without an async
    /// invite flow report none.
    fn list_pending_invitations(&mut self, group: &GroupRef) -> Result<BTreeSet<Identity>, PortError> {
        let _ = group;
        Ok(BTreeSet::new())
    }

    /// Add an identity with a role. Also the role-update operation: adding
    /// an existing member with a new role re-asserts it idempotently.
    fn add_member(
        &mut self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> Result<(), PortError>;

    fn remove_member(&mut self, group: &GroupRef, identity: &Identity) -> Result<(), PortError>;

    /// Identities whose role/membership this system must never alter
    /// (e.g. organization owners).
    fn protected_identities(&mut self) -> Result<BTreeSet<Identity>, PortError> {
        Ok(BTreeSet::new())
    }
}

/// Resource-grant operations (repositories, buckets, policies).
pub trait GrantPort {
    fn list_grants(&mut self, group: &GroupRef) -> Result<BTreeSet<Resource>, PortError>;

    fn grant(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError>;

    /// Assert the permission level on an existing grant. Callers re-assert
    /// unconditionally; implementations must treat this as idempotent.
    fn set_permission(
        &mut self,
        group: &GroupRef,
        resource: &Resource,
        permission: Permission,
    ) -> Result<(), PortError>;

    fn revoke(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError>;
}

/// Versioned secret-store operations.
pub trait SecretStorePort {
    /// Whether anything is stored at or under `prefix`. Drives the
    /// first-write-wins policy.
    fn any_secrets_under(&mut self, prefix: &str) -> Result<bool, PortError>;

    fn write_bundle(&mut self, path: &str, bundle: &SecretBundle) -> Result<(), PortError>;
}

/// Chat-channel membership operations. Channel membership is add-only:
/// there is no removal operation by design.
pub trait ChannelPort {
    fn channel_is_joined(&mut self, channel: &str) -> Result<bool, PortError>;

    /// Join the channel as the automation account so it may invite others.
    fn join_channel(&mut self, channel: &str) -> Result<(), PortError>;

    fn list_channel_members(&mut self, channel: &str) -> Result<BTreeSet<Identity>, PortError>;

    fn invite_to_channel(
        &mut self,
        channel: &str,
        identities: &[Identity],
    ) -> Result<(), PortError>;
}

// ---------------------------------------------------------------------------
// Forwarding impls, so `&mut P` works wherever `P` does
// ---------------------------------------------------------------------------

impl<T: MembershipPort + ?Sized> MembershipPort for &mut T {
    fn ensure_group(&mut self, spec: &GroupSpec) -> Result<GroupRef, PortError> {
        (**self).ensure_group(spec)
    }

    fn list_members(&mut self, group: &GroupRef) -> Result<BTreeMap<Identity, Role>, PortError> {
        (**self).list_members(group)
    }

    fn list_pending_invitations(&mut self, group: &GroupRef) -> Result<BTreeSet<Identity>, PortError> {
        (**self).list_pending_invitations(group)
    }

    fn add_member(
        &mut self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> Result<(), PortError> {
        (**self).add_member(group, identity, role)
    }

    fn remove_member(&mut self, group: &GroupRef, identity: &Identity) -> Result<(), PortError> {
        (**self).remove_member(group, identity)
    }

    fn protected_identities(&mut self) -> Result<BTreeSet<Identity>, PortError> {
        (**self).protected_identities()
    }
}

impl<T: GrantPort + ?Sized> GrantPort for &mut T {
    fn list_grants(&mut self, group: &GroupRef) -> Result<BTreeSet<Resource>, PortError> {
        (**self).list_grants(group)
    }

    fn grant(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError> {
        (**self).grant(group, resource)
    }

    fn set_permission(
        &mut self,
        group: &GroupRef,
        resource: &Resource,
        permission: Permission,
    ) -> Result<(), PortError> {
        (**self).set_permission(group, resource, permission)
    }

    fn revoke(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError> {
        (**self).revoke(group, resource)
    }
}

impl<T: SecretStorePort + ?Sized> SecretStorePort for &mut T {
    fn any_secrets_under(&mut self, prefix: &str) -> Result<bool, PortError> {
        (**self).any_secrets_under(prefix)
    }

    fn write_bundle(&mut self, path: &str, bundle: &SecretBundle) -> Result<(), PortError> {
        (**self).write_bundle(path, bundle)
    }
}

impl<T: ChannelPort + ?Sized> ChannelPort for &mut T {
    fn channel_is_joined(&mut self, channel: &str) -> Result<bool, PortError> {
        (**self).channel_is_joined(channel)
    }

    fn join_channel(&mut self, channel: &str) -> Result<(), PortError> {
        (**self).join_channel(channel)
    }

    fn list_channel_members(&mut self, channel: &str) -> Result<BTreeSet<Identity>, PortError> {
        (**self).list_channel_members(channel)
    }

    fn invite_to_channel(
        &mut self,
        channel: &str,
        identities: &[Identity],
    ) -> Result<(), PortError> {
        (**self).invite_to_channel(channel, identities)
    }
}
