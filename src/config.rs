//! Declarative access configuration: loading and normalization.
//!
//! The config file is a JSON array of groups, each granting a set of teams
//! and app installations to a set of repositories. Normalization flattens the
//! groups into a per-repository map and rejects configs that restate the main
//! team (its admin right is implied) or list a repository twice.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::Permission;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("team {0} should not be listed - this is implied")]
    MainTeamListed(String),

    #[error("repo {0} listed twice")]
    DuplicateRepo(String),

    #[error("failed to read access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse access config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One group of repositories sharing a set of team grants and app
/// installations.
#[derive(Debug, Deserialize)]
pub struct AccessGroup {
    pub repos: Vec<String>,
    pub teams: BTreeMap<String, Permission>,
    /// App-name to opaque flag; presence of the key is what matters.
    #[serde(default)]
    pub apps: BTreeMap<String, bool>,
}

/// Desired team grants and app installations for a single repository.
#[derive(Debug, Clone, Default)]
pub struct RepoConfig {
    pub teams: BTreeMap<String, Permission>,
    pub apps: BTreeMap<String, bool>,
}

/// Per-repository desired state, flattened from the grouped config.
/// Built once per run and immutable afterwards.
pub type DesiredState = BTreeMap<String, RepoConfig>;

/// Reads and parses the access config file.
pub fn load(path: &Path) -> Result<Vec<AccessGroup>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Flattens config groups into the per-repository desired-state map.
///
/// The main team must never be listed explicitly and no repository may appear
/// in more than one group.
pub fn normalize(groups: Vec<AccessGroup>, main_team: &str) -> Result<DesiredState, ConfigError> {
    let mut desired = DesiredState::new();
    for group in groups {
        if group.teams.contains_key(main_team) {
            return Err(ConfigError::MainTeamListed(main_team.to_string()));
        }
        for repo in group.repos {
            if desired.contains_key(&repo) {
                return Err(ConfigError::DuplicateRepo(repo));
            }
            desired.insert(
                repo,
                RepoConfig {
                    teams: group.teams.clone(),
                    apps: group.apps.clone(),
                },
            );
        }
    }
    Ok(desired)
}
