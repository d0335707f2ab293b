//! Error types for roster-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Handle, TeamSlug};

/// All errors that can arise while loading and validating definitions.
///
/// Every variant is a startup error: nothing is reconciled until the whole
/// desired state loads cleanly.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending file path.
    #[error("failed to parse definition at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The definitions directory (or a required subdirectory) is missing.
    #[error("definitions directory not found at {path}")]
    MissingDir { path: PathBuf },

    /// Two team files declare the same slug.
    #[error("duplicate team slug '{slug}'")]
    DuplicateSlug { slug: TeamSlug },

    /// A role list references a handle with no contributor definition.
    #[error("team '{team}' references unknown contributor '{handle}'")]
    UnknownHandle { team: TeamSlug, handle: Handle },

    /// A team has no leads; every team needs at least one maintainer.
    #[error("team '{team}' has no leads")]
    MissingLeads { team: TeamSlug },

    /// `create-oidc-clients` requires a site slug to derive client URLs.
    #[error("team '{team}' enables OIDC clients but has no site-slug")]
    MissingSiteSlug { team: TeamSlug },
}

/// Convenience constructor for [`LoadError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.into(),
        source,
    }
}
