//! # roster-core
//!
//! Desired-state model for organizational membership: contributors, teams,
//! derived role sets, definition loading/validation, and the environment
//! URL conventions.
//!
//! Everything here is pure and offline. Loading happens once at process
//! start; the resulting [`types::DesiredState`] is read-only for the whole
//! run.

pub mod env;
pub mod error;
pub mod loader;
pub mod types;

pub use error::LoadError;
pub use types::{Contributor, DesiredState, Handle, SecretsLayout, Team, TeamSlug};
