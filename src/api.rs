//! Narrow interface over the remote GitHub and Dependabot surfaces.
//!
//! The reconciliation engine only ever talks to [`GithubApi`], so tests can
//! substitute an in-memory fake with no network dependency. The live
//! implementation lives in [`crate::github`].

use anyhow::Result;
use async_trait::async_trait;

use crate::Permission;

/// An organization team, as listed once at startup for the team registry.
#[derive(Debug, Clone)]
pub struct OrgTeam {
    pub name: String,
    pub slug: String,
}

/// A repository as seen through the main team's repository listing.
#[derive(Debug, Clone)]
pub struct TeamRepo {
    pub name: String,
    /// Numeric repository id, needed by the installation-membership endpoint.
    pub id: u64,
    pub archived: bool,
    /// Whether the authenticated view of this repository carries admin rights.
    pub admin: bool,
}

/// One team's permission entry on a repository.
#[derive(Debug, Clone)]
pub struct TeamAccess {
    pub team: String,
    pub permission: Permission,
}

/// Outcome of a Dependabot update-config creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOutcome {
    Created,
    /// The config was already present; a benign no-op, not an error.
    AlreadyExists,
}

/// Everything the reconciler needs from the remote side.
#[async_trait]
pub trait GithubApi {
    /// Lists every team in the organization.
    async fn list_org_teams(&self, org: &str) -> Result<Vec<OrgTeam>>;

    /// Lists every repository the given team can see.
    async fn list_team_repos(&self, org: &str, team_slug: &str) -> Result<Vec<TeamRepo>>;

    /// Lists the teams holding a permission on a repository.
    async fn list_repo_teams(&self, org: &str, repo: &str) -> Result<Vec<TeamAccess>>;

    /// Sets a team's permission on a repository. Idempotent: grants access or
    /// updates the existing tier, whichever applies.
    async fn set_team_permission(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
        permission: Permission,
    ) -> Result<()>;

    /// Removes a team's access to a repository.
    async fn remove_team_from_repo(&self, org: &str, team_slug: &str, repo: &str) -> Result<()>;

    /// Languages detected for a repository.
    async fn list_repo_languages(&self, org: &str, repo: &str) -> Result<Vec<String>>;

    /// File names at the repository root.
    async fn list_root_files(&self, org: &str, repo: &str) -> Result<Vec<String>>;

    /// Adds a repository to an app installation. Idempotent on the remote side.
    async fn add_repo_to_installation(&self, installation_id: u64, repo_id: u64) -> Result<()>;

    /// Submits a Dependabot update config for one repo/package-manager pair.
    async fn create_dependabot_config(
        &self,
        repo_id: u64,
        package_manager: &str,
    ) -> Result<ConfigOutcome>;
}
