//! Object-storage synchronizer: one bucket per team plus a read-only and an
//! admin service account, each scoped to the team's bucket.
//!
//! Buckets and service accounts are create-if-absent; nothing is ever
//! deleted here. Freshly generated credentials are recorded on the
//! [`RunState`] so the secrets synchronizer can materialize them later in
//! the same run.

use std::collections::BTreeSet;

use roster_core::types::{DesiredState, Team};
use roster_engine::{attempt, PortError, RunReport};
use serde_json::{json, Value};

use crate::synchronizer::{team_banner, RunState, StorageCredentials, Synchronizer};

/// Object-store provisioning operations.
pub trait StoragePort {
    fn list_buckets(&mut self) -> Result<BTreeSet<String>, PortError>;

    fn create_bucket(&mut self, name: &str) -> Result<(), PortError>;

    fn list_service_accounts(&mut self) -> Result<BTreeSet<String>, PortError>;

    /// Create a service account bound to `policy` and return its freshly
    /// generated credentials.
    fn create_service_account(
        &mut self,
        name: &str,
        description: &str,
        policy: &Value,
    ) -> Result<StorageCredentials, PortError>;
}

impl<T: StoragePort + ?Sized> StoragePort for &mut T {
    fn list_buckets(&mut self) -> Result<BTreeSet<String>, PortError> {
        (**self).list_buckets()
    }

    fn create_bucket(&mut self, name: &str) -> Result<(), PortError> {
        (**self).create_bucket(name)
    }

    fn list_service_accounts(&mut self) -> Result<BTreeSet<String>, PortError> {
        (**self).list_service_accounts()
    }

    fn create_service_account(
        &mut self,
        name: &str,
        description: &str,
        policy: &Value,
    ) -> Result<StorageCredentials, PortError> {
        (**self).create_service_account(name, description, policy)
    }
}

/// Service-account flavors provisioned per team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    ReadOnly,
    Admin,
}

impl AccountKind {
    fn label(self) -> &'static str {
        match self {
            AccountKind::ReadOnly => "Read-Only",
            AccountKind::Admin => "Admin",
        }
    }
}

/// Bucket-scoped policy documents.
fn read_only_policy(team_slug: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["s3:GetBucketLocation", "s3:ListBucket"],
                "Resource": [format!("arn:aws:s3:::{team_slug}")],
            },
            {
                "Effect": "Allow",
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{team_slug}/*")],
            },
        ],
    })
}

fn admin_policy(team_slug: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["s3:*"],
                "Resource": [format!("arn:aws:s3:::{team_slug}/*")],
            },
        ],
    })
}

/// Reconciles object storage for every team.
pub struct MinioSynchronizer<'a, P> {
    port: P,
    desired: &'a DesiredState,
}

impl<'a, P: StoragePort> MinioSynchronizer<'a, P> {
    pub fn new(port: P, desired: &'a DesiredState) -> Self {
        Self { port, desired }
    }

    fn sync_team(
        &mut self,
        team: &Team,
        existing_buckets: &BTreeSet<String>,
        existing_accounts: &BTreeSet<String>,
        state: &mut RunState,
        report: &mut RunReport,
    ) {
        if !team.sync_minio {
            tracing::debug!("team {} opted out of MinIO sync, skipping", team.name);
            return;
        }

        self.sync_bucket(team, existing_buckets, report);

        let read_only = self.sync_service_account(team, AccountKind::ReadOnly, existing_accounts, report);
        let admin = self.sync_service_account(team, AccountKind::Admin, existing_accounts, report);

        let credentials = state.storage_credentials_mut(&team.slug);
        credentials.read_only = read_only;
        credentials.admin = admin;
    }

    fn sync_bucket(&mut self, team: &Team, existing: &BTreeSet<String>, report: &mut RunReport) {
        let bucket = &team.slug.0;
        if existing.contains(bucket) {
            tracing::debug!("MinIO bucket {bucket} already exists, skipping");
            return;
        }
        attempt(report, &format!("create MinIO bucket {bucket}"), || {
            self.port.create_bucket(bucket)
        });
    }

    /// Create one service account if absent. Credentials exist only at
    /// creation time; accounts that already exist yield none.
    fn sync_service_account(
        &mut self,
        team: &Team,
        kind: AccountKind,
        existing: &BTreeSet<String>,
        report: &mut RunReport,
    ) -> Option<StorageCredentials> {
        let account_name = format!("{} {}", team.name, kind.label());
        if existing.contains(&account_name) {
            tracing::debug!("MinIO service account {account_name} already exists, skipping");
            return None;
        }

        let description = format!("{} access to {} bucket", kind.label(), team.slug);
        let policy = match kind {
            AccountKind::ReadOnly => read_only_policy(&team.slug.0),
            AccountKind::Admin => admin_policy(&team.slug.0),
        };

        attempt(
            report,
            &format!("create MinIO service account {account_name}"),
            || self.port.create_service_account(&account_name, &description, &policy),
        )
    }
}

impl<P: StoragePort> Synchronizer for MinioSynchronizer<'_, P> {
    fn name(&self) -> &'static str {
        "minio"
    }

    fn sync(&mut self, state: &mut RunState, report: &mut RunReport) {
        let Some(existing_buckets) = attempt(report, "list MinIO buckets", || {
            self.port.list_buckets()
        }) else {
            return;
        };
        let Some(existing_accounts) = attempt(report, "list MinIO service accounts", || {
            self.port.list_service_accounts()
        }) else {
            return;
        };

        let desired = self.desired;
        for team in desired.teams.values() {
            team_banner(team);
            self.sync_team(team, &existing_buckets, &existing_accounts, state, report);
        }
    }
}
