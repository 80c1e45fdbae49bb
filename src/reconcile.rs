//! The reconciliation engine: diffs desired against observed repository
//! access and applies the minimal set of permission mutations.
//!
//! Only repositories the main team administers are touched, one at a time.
//! Anomalies the tool will not auto-correct (a second admin team, a repo with
//! no config, a lost admin grant) are reported through the [`ErrorSink`] and
//! the sweep moves on; a misconfigured repository is never partially modified.

use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{GithubApi, OrgTeam, TeamAccess, TeamRepo};
use crate::config::{DesiredState, RepoConfig};
use crate::dependabot;
use crate::report::ErrorSink;
use crate::Permission;

/// Installation ids for the third-party apps the config may reference.
pub const DEPENDABOT_INSTALLATION_ID: u64 = 185_591;
pub const SLACK_INSTALLATION_ID: u64 = 176_550;

fn installation_id(app: &str) -> Option<u64> {
    match app {
        "dependabot" => Some(DEPENDABOT_INSTALLATION_ID),
        "slack" => Some(SLACK_INSTALLATION_ID),
        _ => None,
    }
}

pub struct Reconciler<'a> {
    api: &'a dyn GithubApi,
    org: String,
    main_team: OrgTeam,
    /// All teams in the organization, resolved once at startup.
    teams: HashMap<String, OrgTeam>,
    sink: ErrorSink,
}

impl std::fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("org", &self.org)
            .field("main_team", &self.main_team)
            .finish_non_exhaustive()
    }
}

impl<'a> Reconciler<'a> {
    /// Builds the team registry and resolves the main team by name.
    pub async fn new(api: &'a dyn GithubApi, org: &str, main_team: &str) -> Result<Reconciler<'a>> {
        let teams: HashMap<String, OrgTeam> = api
            .list_org_teams(org)
            .await
            .with_context(|| format!("failed to list teams of organization {org}"))?
            .into_iter()
            .map(|team| (team.name.clone(), team))
            .collect();
        let main_team = teams
            .get(main_team)
            .cloned()
            .with_context(|| format!("main team {main_team} not found in organization {org}"))?;
        Ok(Reconciler {
            api,
            org: org.to_string(),
            main_team,
            teams,
            sink: ErrorSink::new(),
        })
    }

    /// One full reconciliation sweep. Returns every error reported along the
    /// way; only failures that make the whole sweep meaningless (listing the
    /// main team's repositories) surface as `Err`.
    pub async fn run(mut self, desired: &DesiredState) -> Result<Vec<String>> {
        let repos = self
            .api
            .list_team_repos(&self.org, &self.main_team.slug)
            .await
            .with_context(|| format!("failed to list repositories of team {}", self.main_team.name))?;

        let mut seen = HashSet::new();
        for repo in repos {
            // Archived repos are frozen; repos the team does not administer
            // are out of scope. Both skip silently.
            if repo.archived || !repo.admin {
                continue;
            }
            seen.insert(repo.name.clone());
            match desired.get(&repo.name) {
                Some(config) => self.reconcile_repo(&repo, config).await,
                None => self.sink.report(format!(
                    "team has admin access to {}, but there is no config for that repository",
                    repo.name
                )),
            }
        }

        for name in desired.keys() {
            if !seen.contains(name) {
                self.sink.report(format!(
                    "config contained repo {name}, but team does not have admin access"
                ));
            }
        }

        Ok(self.sink.into_errors())
    }

    async fn reconcile_repo(&mut self, repo: &TeamRepo, config: &RepoConfig) {
        let access = match self.api.list_repo_teams(&self.org, &repo.name).await {
            Ok(access) => access,
            Err(err) => {
                self.sink
                    .report(format!("failed to list teams of repo {}: {err:#}", repo.name));
                return;
            }
        };

        // The repository listing said admin, but permissions can change
        // between the two reads. Re-verify before mutating anything.
        if !self.main_team_has_admin(&access) {
            self.sink.report(format!(
                "team does not have admin access to repo {}",
                repo.name
            ));
            return;
        }

        let current: HashMap<&str, Permission> = access
            .iter()
            .filter(|entry| entry.team != self.main_team.name)
            .map(|entry| (entry.team.as_str(), entry.permission))
            .collect();

        let names: BTreeSet<&str> = current
            .keys()
            .copied()
            .chain(config.teams.keys().map(String::as_str))
            .collect();
        for name in names {
            self.reconcile_team(
                repo,
                name,
                current.get(name).copied(),
                config.teams.get(name).copied(),
            )
            .await;
        }

        self.reconcile_apps(repo, config).await;
    }

    fn main_team_has_admin(&self, access: &[TeamAccess]) -> bool {
        let entries: Vec<&TeamAccess> = access
            .iter()
            .filter(|entry| entry.team == self.main_team.name)
            .collect();
        // The API never returns duplicate team entries for one repo.
        debug_assert!(entries.len() <= 1, "duplicate main team entries");
        entries.len() == 1 && entries[0].permission == Permission::Admin
    }

    async fn reconcile_team(
        &mut self,
        repo: &TeamRepo,
        name: &str,
        current: Option<Permission>,
        desired: Option<Permission>,
    ) {
        // Exactly one team administers a repo. A desired second admin is
        // flagged for a deliberate manual transfer, never applied.
        if desired == Some(Permission::Admin) {
            self.sink.report(format!(
                "additional team {name} has admin access to repo {} (resolve by completing transfer)",
                repo.name
            ));
            return;
        }

        let Some(team) = self.teams.get(name) else {
            self.sink.report(format!(
                "unknown team {name} specified for repo {}",
                repo.name
            ));
            return;
        };

        if current == desired {
            info!(
                "team {name} {} permission to repo {} unchanged",
                label(desired),
                repo.name
            );
            return;
        }

        match desired {
            None => {
                info!(
                    "revoking team {name} {} permission from repo {}",
                    label(current),
                    repo.name
                );
                if let Err(err) = self
                    .api
                    .remove_team_from_repo(&self.org, &team.slug, &repo.name)
                    .await
                {
                    self.sink.report(format!(
                        "failed to revoke team {name} access to repo {}: {err:#}",
                        repo.name
                    ));
                }
            }
            Some(permission) => {
                info!(
                    "granting team {name} {permission} permission to repo {} (was {})",
                    repo.name,
                    label(current)
                );
                if let Err(err) = self
                    .api
                    .set_team_permission(&self.org, &team.slug, &repo.name, permission)
                    .await
                {
                    self.sink.report(format!(
                        "failed to set team {name} {permission} permission on repo {}: {err:#}",
                        repo.name
                    ));
                }
            }
        }
    }

    async fn reconcile_apps(&mut self, repo: &TeamRepo, config: &RepoConfig) {
        for app in config.apps.keys() {
            self.add_repo_to_app(app, repo).await;
            if app == "dependabot" {
                dependabot::provision(self.api, &self.org, repo, &mut self.sink).await;
            }
        }
    }

    async fn add_repo_to_app(&mut self, app: &str, repo: &TeamRepo) {
        let Some(installation) = installation_id(app) else {
            self.sink.report(format!(
                "unknown app {app} specified for repo {}",
                repo.name
            ));
            return;
        };
        if let Err(err) = self.api.add_repo_to_installation(installation, repo.id).await {
            self.sink.report(format!(
                "failed to add repo {} to {app} app installation: {err:#}",
                repo.name
            ));
        }
    }
}

fn label(permission: Option<Permission>) -> &'static str {
    permission.map(|p| p.as_str()).unwrap_or("no")
}
