//! Definition loading and validation.
//!
//! # Storage layout
//!
//! ```text
//! <dir>/
//!   contributors/
//!     <handle>.yaml      (one file per contributor — stem is the handle)
//!   teams/
//!     <team>.yaml        (one file per team — slug comes from the document)
//! ```
//!
//! Loading happens once at process start; the returned [`DesiredState`] is
//! read-only for the rest of the run. Validation failures are startup
//! errors — no reconciliation runs against a partially valid state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, LoadError};
use crate::types::{Contributor, DesiredState, Handle, Team, TeamSlug};

/// Load and validate the whole desired state from `<dir>/contributors/` and
/// `<dir>/teams/`.
pub fn load_dir(dir: &Path) -> Result<DesiredState, LoadError> {
    let contributors = load_contributors(&dir.join("contributors"))?;
    let teams = load_teams(&dir.join("teams"))?;
    validate(&contributors, &teams)?;
    Ok(DesiredState {
        contributors,
        teams,
    })
}

/// Load every `*.yaml` contributor definition; the file stem is the handle.
pub fn load_contributors(dir: &Path) -> Result<BTreeMap<Handle, Contributor>, LoadError> {
    let mut contributors = BTreeMap::new();
    for path in yaml_files(dir)? {
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let mut contributor: Contributor = serde_yaml::from_str(&contents)
            .map_err(|e| LoadError::Parse {
                path: path.clone(),
                source: e,
            })?;
        contributor.handle = Handle::from(file_stem(&path));
        contributors.insert(contributor.handle.clone(), contributor);
    }
    Ok(contributors)
}

/// Load every `*.yaml` team definition, keyed and deduplicated by slug.
pub fn load_teams(dir: &Path) -> Result<BTreeMap<TeamSlug, Team>, LoadError> {
    let mut teams: BTreeMap<TeamSlug, Team> = BTreeMap::new();
    for path in yaml_files(dir)? {
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let team: Team = serde_yaml::from_str(&contents).map_err(|e| LoadError::Parse {
            path: path.clone(),
            source: e,
        })?;
        if teams.contains_key(&team.slug) {
            return Err(LoadError::DuplicateSlug { slug: team.slug });
        }
        teams.insert(team.slug.clone(), team);
    }
    Ok(teams)
}

/// Cross-entity validation: every role-list handle must resolve, every team
/// needs leads, and OIDC-enabled teams need a site slug.
fn validate(
    contributors: &BTreeMap<Handle, Contributor>,
    teams: &BTreeMap<TeamSlug, Team>,
) -> Result<(), LoadError> {
    for team in teams.values() {
        if team.leads.is_empty() {
            return Err(LoadError::MissingLeads {
                team: team.slug.clone(),
            });
        }
        if team.create_oidc_clients && team.site_slug.is_none() {
            return Err(LoadError::MissingSiteSlug {
                team: team.slug.clone(),
            });
        }

        let declared = team
            .leads
            .iter()
            .chain(team.devs.iter())
            .chain(team.applicants.iter().flatten());
        for handle in declared {
            if !contributors.contains_key(handle) {
                return Err(LoadError::UnknownHandle {
                    team: team.slug.clone(),
                    handle: handle.clone(),
                });
            }
        }
        // ext-admins are broker usernames of outsiders, never validated
        // against the contributor map.
    }
    Ok(())
}

/// All `*.yaml` / `*.yml` files under `dir`, sorted for determinism.
fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDir {
            path: dir.to_path_buf(),
        });
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
