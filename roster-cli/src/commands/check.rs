//! `roster check` — validate the definitions offline and summarize them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use roster_core::loader;
use roster_core::types::{SecretsLayout, Team};

/// Arguments for `roster check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory holding contributors/ and teams/.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Tabled)]
struct TeamRow {
    #[tabled(rename = "team")]
    team: String,
    #[tabled(rename = "leads")]
    leads: usize,
    #[tabled(rename = "devs")]
    devs: usize,
    #[tabled(rename = "repos")]
    repos: usize,
    #[tabled(rename = "channels")]
    channels: usize,
    #[tabled(rename = "secrets")]
    secrets: String,
    #[tabled(rename = "opt-outs")]
    opt_outs: String,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let desired = loader::load_dir(&self.dir)
            .with_context(|| format!("failed to load definitions from {}", self.dir.display()))?;

        println!(
            "{}",
            format!(
                "✓ definitions valid: {} contributor(s), {} team(s)",
                desired.contributors.len(),
                desired.teams.len()
            )
            .green()
        );

        if desired.teams.is_empty() {
            return Ok(());
        }

        let rows: Vec<TeamRow> = desired.teams.values().map(team_row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn team_row(team: &Team) -> TeamRow {
    TeamRow {
        team: team.slug.0.clone(),
        leads: team.leads.len(),
        devs: team.devs.len(),
        repos: team.repos.len(),
        channels: team.slack_channel_ids.len(),
        secrets: match team.secrets_layout {
            SecretsLayout::Single => "single".to_owned(),
            SecretsLayout::Multi => "multi".to_owned(),
            SecretsLayout::None => "none".to_owned(),
        },
        opt_outs: opt_outs(team),
    }
}

/// Compact list of the flags that differ from their defaults.
fn opt_outs(team: &Team) -> String {
    let mut flags = Vec::new();
    if !team.remove_unlisted {
        flags.push("keep-unlisted");
    }
    if !team.sync_github {
        flags.push("no-github");
    }
    if !team.sync_minio {
        flags.push("no-minio");
    }
    if !team.create_oidc_clients {
        flags.push("no-oidc");
    }
    if team.aggregate_maintainers {
        flags.push("aggregates-maintainers");
    }
    if flags.is_empty() {
        "—".to_owned()
    } else {
        flags.join(",")
    }
}
