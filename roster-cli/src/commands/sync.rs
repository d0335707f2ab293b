//! `roster sync` — reconcile the desired state against the selected
//! services.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use roster_core::loader;
use roster_core::types::DesiredState;
use roster_engine::RunReport;
use roster_services::{
    AuthEndpoints, GithubSynchronizer, KeycloakSynchronizer, MinioSynchronizer, Runner,
    SecretsSynchronizer, ServiceName, SlackSynchronizer,
};

use crate::clients::{GithubClient, KeycloakClient, MinioClient, SlackClient, VaultClient};
use crate::config::Settings;

/// Arguments for `roster sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory holding contributors/ and teams/.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Services to sync (defaults to all of them).
    #[arg(long = "services", num_args = 1.., value_parser = parse_service)]
    pub services: Option<Vec<ServiceName>>,
}

fn parse_service(s: &str) -> Result<ServiceName, String> {
    s.parse()
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let selected = match self.services {
            Some(mut services) => {
                services.dedup();
                services
            }
            None => ServiceName::ALL.to_vec(),
        };

        let desired = loader::load_dir(&self.dir)
            .with_context(|| format!("failed to load definitions from {}", self.dir.display()))?;
        let settings = Settings::from_env(&selected)?;

        let report = run_selected(&desired, settings, &selected)?;
        print_summary(&report);

        if report.has_errors() {
            bail!("{} error(s) were recorded during the run", report.errors());
        }
        Ok(())
    }
}

/// Build every selected synchronizer with its service handles and run them
/// in canonical order.
fn run_selected(
    desired: &DesiredState,
    settings: Settings,
    selected: &[ServiceName],
) -> Result<RunReport> {
    let mut runner = Runner::new();

    if selected.contains(&ServiceName::Github) {
        let github = settings.github.clone().context("github settings missing")?;
        runner.register(
            ServiceName::Github,
            Box::new(GithubSynchronizer::new(GithubClient::new(github), desired)),
        );
    }

    if selected.contains(&ServiceName::Keycloak) {
        let keycloak = settings.keycloak.clone().context("keycloak settings missing")?;
        runner.register(
            ServiceName::Keycloak,
            Box::new(KeycloakSynchronizer::new(KeycloakClient::new(keycloak), desired)),
        );
    }

    if selected.contains(&ServiceName::Minio) {
        let minio = settings.minio.clone().context("minio settings missing")?;
        let client = MinioClient::connect(minio).context("failed to log in to MinIO")?;
        runner.register(
            ServiceName::Minio,
            Box::new(MinioSynchronizer::new(client, desired)),
        );
    }

    if selected.contains(&ServiceName::Slack) {
        let slack = settings.slack.clone().context("slack settings missing")?;
        runner.register(
            ServiceName::Slack,
            Box::new(SlackSynchronizer::new(SlackClient::new(slack), desired)),
        );
    }

    if selected.contains(&ServiceName::Secrets) {
        let vault = settings.vault.clone().context("vault settings missing")?;
        let keycloak = settings.keycloak.clone().context("keycloak settings missing")?;
        let endpoints = AuthEndpoints {
            issuer: keycloak.issuer(),
        };
        runner.register(
            ServiceName::Secrets,
            Box::new(SecretsSynchronizer::new(
                VaultClient::new(vault),
                KeycloakClient::new(keycloak),
                endpoints,
                desired,
            )),
        );
    }

    Ok(runner.run(selected))
}

fn print_summary(report: &RunReport) {
    let elapsed = Utc::now()
        .signed_duration_since(report.started_at())
        .num_seconds();
    if report.has_errors() {
        println!(
            "{}",
            format!(
                "✗ sync finished in {elapsed}s with {} error(s) and {} warning(s)",
                report.errors(),
                report.warnings()
            )
            .red()
            .bold()
        );
    } else if report.has_warnings() {
        println!(
            "{}",
            format!(
                "⚠ sync finished in {elapsed}s with {} warning(s)",
                report.warnings()
            )
            .yellow()
        );
    } else {
        println!("{}", format!("✓ sync completed cleanly in {elapsed}s").green());
    }
}
