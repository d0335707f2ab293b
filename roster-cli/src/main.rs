//! Roster — declarative org-membership reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! roster sync [--dir <path>] [--services <github|keycloak|minio|slack|secrets>...]
//! roster check [--dir <path>]
//! ```
//!
//! `sync` loads the contributor/team definitions, validates them, then runs
//! the selected synchronizers in canonical order (minio always precedes
//! secrets). Exit status is non-zero when any error-level event was
//! recorded or startup validation failed; a warning-only run exits 0.

mod clients;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Reconcile team and contributor definitions against external services",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the definitions against the selected services.
    Sync(SyncArgs),

    /// Validate the definitions offline and print a summary.
    Check(CheckArgs),
}

fn main() -> Result<()> {
    // Credentials commonly live in an untracked .env next to the
    // definitions; absence is fine.
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Check(args) => args.run(),
    }
}
