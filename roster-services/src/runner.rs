//! The run coordinator: an ordered registry of synchronizers.
//!
//! Registration order is execution order, regardless of how the selection
//! was spelled on the command line — the storage pass must run before the
//! secrets pass so freshly generated credentials can be materialized in the
//! same run.

use std::fmt;
use std::str::FromStr;

use roster_engine::RunReport;

use crate::synchronizer::{RunState, Synchronizer};

/// Names of the registered synchronizers, in canonical execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceName {
    Github,
    Keycloak,
    Minio,
    Slack,
    Secrets,
}

impl ServiceName {
    pub const ALL: [ServiceName; 5] = [
        ServiceName::Github,
        ServiceName::Keycloak,
        ServiceName::Minio,
        ServiceName::Slack,
        ServiceName::Secrets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Github => "github",
            ServiceName::Keycloak => "keycloak",
            ServiceName::Minio => "minio",
            ServiceName::Slack => "slack",
            ServiceName::Secrets => "secrets",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(ServiceName::Github),
            "keycloak" => Ok(ServiceName::Keycloak),
            "minio" => Ok(ServiceName::Minio),
            "slack" => Ok(ServiceName::Slack),
            "secrets" => Ok(ServiceName::Secrets),
            other => Err(format!(
                "unknown service '{other}'; expected: github, keycloak, minio, slack, secrets"
            )),
        }
    }
}

/// Sequences synchronizers and aggregates their outcome into one
/// [`RunReport`].
#[derive(Default)]
pub struct Runner<'a> {
    entries: Vec<(ServiceName, Box<dyn Synchronizer + 'a>)>,
}

impl<'a> Runner<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a synchronizer. Order of registration is order of
    /// execution.
    pub fn register(&mut self, name: ServiceName, synchronizer: Box<dyn Synchronizer + 'a>) {
        self.entries.push((name, synchronizer));
    }

    /// Run every registered synchronizer whose name is in `selected`,
    /// in registration order.
    pub fn run(&mut self, selected: &[ServiceName]) -> RunReport {
        let mut report = RunReport::new();
        let mut state = RunState::default();

        for (name, synchronizer) in &mut self.entries {
            if !selected.contains(name) {
                continue;
            }
            section(name.as_str());
            synchronizer.sync(&mut state, &mut report);
        }

        report
    }
}

fn section(title: &str) {
    tracing::info!("{}", "=".repeat(50));
    tracing::info!("syncing {title}...");
    tracing::info!("{}", "=".repeat(50));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
