//! The synchronizer contract and the run-scoped state shared across
//! synchronizers.

use std::collections::BTreeMap;

use roster_core::types::{Team, TeamSlug};
use roster_engine::RunReport;

/// One external system's reconciliation pass.
///
/// Implementations receive their service handles and the desired state at
/// construction and report every per-operation failure through the
/// [`RunReport`] rather than returning errors: a broken team or identity
/// must not stop the rest of the run.
pub trait Synchronizer {
    fn name(&self) -> &'static str;

    fn sync(&mut self, state: &mut RunState, report: &mut RunReport);
}

/// A generated access-key/secret-key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Both service-account credential pairs provisioned for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamStorageCredentials {
    pub read_only: Option<StorageCredentials>,
    pub admin: Option<StorageCredentials>,
}

/// Mutable state scoped to a single run.
///
/// This is the only channel between synchronizers: credentials generated by
/// the storage pass flow to the secrets pass here, never through the
/// (read-only) desired-state model.
#[derive(Debug, Default)]
pub struct RunState {
    storage_credentials: BTreeMap<TeamSlug, TeamStorageCredentials>,
}

impl RunState {
    pub fn storage_credentials_mut(&mut self, slug: &TeamSlug) -> &mut TeamStorageCredentials {
        self.storage_credentials.entry(slug.clone()).or_default()
    }

    pub fn storage_credentials(&self, slug: &TeamSlug) -> Option<&TeamStorageCredentials> {
        self.storage_credentials.get(slug)
    }
}

/// Log the per-team banner around a team pass.
pub(crate) fn team_banner(team: &Team) {
    tracing::info!("syncing team {}...", team.name);
}
