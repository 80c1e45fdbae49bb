//! Live [`GithubApi`] implementation.
//!
//! Typed GitHub calls go through octocrab. The installation-membership and
//! Dependabot endpoints are not covered by octocrab, so those two go through
//! a plain reqwest client authenticated with the same token.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use octocrab::models::Repository;
use octocrab::params::teams::Permission as TeamPermission;
use octocrab::{Octocrab, Page};
use reqwest::StatusCode;
use serde_json::json;

use crate::api::{ConfigOutcome, GithubApi, OrgTeam, TeamAccess, TeamRepo};
use crate::Permission;

const GITHUB_API: &str = "https://api.github.com";
const DEPENDABOT_API: &str = "https://api.dependabot.com/update_configs";

/// Account the Dependabot update configs are filed under.
const DEPENDABOT_ACCOUNT_ID: &str = "2012700";

pub struct GithubClient {
    octocrab: Octocrab,
    http: reqwest::Client,
    token: String,
}

impl GithubClient {
    pub fn new(token: String) -> Result<GithubClient> {
        let octocrab = Octocrab::builder().personal_token(token.clone()).build()?;
        let http = reqwest::Client::builder()
            .user_agent("github-access")
            .build()?;
        Ok(GithubClient {
            octocrab,
            http,
            token,
        })
    }

    /// Drains a paginated listing by following the `next` link until
    /// exhausted, accumulating into a fresh vector.
    async fn collect_pages<T: serde::de::DeserializeOwned>(
        &self,
        mut page: Page<T>,
    ) -> Result<Vec<T>> {
        let mut items = page.take_items();
        while let Some(next) = self.octocrab.get_page::<T>(&page.next).await? {
            page = next;
            items.extend(page.take_items());
        }
        Ok(items)
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn list_org_teams(&self, org: &str) -> Result<Vec<OrgTeam>> {
        let page = self.octocrab.teams(org).list().per_page(100).send().await?;
        let teams = self.collect_pages(page).await?;
        Ok(teams
            .into_iter()
            .map(|team| OrgTeam {
                name: team.name,
                slug: team.slug,
            })
            .collect())
    }

    async fn list_team_repos(&self, org: &str, team_slug: &str) -> Result<Vec<TeamRepo>> {
        let page: Page<Repository> = self
            .octocrab
            .get(format!("/orgs/{org}/teams/{team_slug}/repos"), None::<&()>)
            .await?;
        let repos = self.collect_pages(page).await?;
        Ok(repos
            .into_iter()
            .map(|repo| TeamRepo {
                name: repo.name,
                id: repo.id.0,
                archived: repo.archived.unwrap_or(false),
                admin: repo.permissions.map(|p| p.admin).unwrap_or(false),
            })
            .collect())
    }

    async fn list_repo_teams(&self, org: &str, repo: &str) -> Result<Vec<TeamAccess>> {
        let page = self
            .octocrab
            .repos(org, repo)
            .list_teams()
            .per_page(100)
            .send()
            .await?;
        let teams = self.collect_pages(page).await?;
        teams
            .into_iter()
            .map(|team| {
                let permission = Permission::from_api_label(&team.permission).ok_or_else(|| {
                    anyhow!(
                        "unsupported permission {} for team {} on repo {repo}",
                        team.permission,
                        team.name
                    )
                })?;
                Ok(TeamAccess {
                    team: team.name,
                    permission,
                })
            })
            .collect()
    }

    async fn set_team_permission(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
        permission: Permission,
    ) -> Result<()> {
        let permission = match permission {
            Permission::Admin => TeamPermission::Admin,
            Permission::Push => TeamPermission::Push,
            Permission::Pull => TeamPermission::Pull,
        };
        self.octocrab
            .teams(org)
            .repos(team_slug)
            .add_or_update(org, repo, Some(permission))
            .await?;
        Ok(())
    }

    async fn remove_team_from_repo(&self, org: &str, team_slug: &str, repo: &str) -> Result<()> {
        self.octocrab
            .teams(org)
            .repos(team_slug)
            .remove(org, repo)
            .await?;
        Ok(())
    }

    async fn list_repo_languages(&self, org: &str, repo: &str) -> Result<Vec<String>> {
        let languages: HashMap<String, u64> = self
            .octocrab
            .get(format!("/repos/{org}/{repo}/languages"), None::<&()>)
            .await?;
        Ok(languages.into_keys().collect())
    }

    async fn list_root_files(&self, org: &str, repo: &str) -> Result<Vec<String>> {
        let contents = self.octocrab.repos(org, repo).get_content().send().await?;
        Ok(contents.items.into_iter().map(|item| item.name).collect())
    }

    async fn add_repo_to_installation(&self, installation_id: u64, repo_id: u64) -> Result<()> {
        let url = format!("{GITHUB_API}/user/installations/{installation_id}/repositories/{repo_id}");
        let response = self
            .http
            .put(url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.machine-man-preview+json")
            .send()
            .await?;
        if response.status() != StatusCode::NO_CONTENT {
            bail!("unexpected status {}", response.status());
        }
        Ok(())
    }

    async fn create_dependabot_config(
        &self,
        repo_id: u64,
        package_manager: &str,
    ) -> Result<ConfigOutcome> {
        let body = json!({
            "repo-id": repo_id,
            "package-manager": package_manager,
            "update-schedule": "daily",
            "directory": "/",
            "account-id": DEPENDABOT_ACCOUNT_ID,
            "account-type": "org",
        });
        let response = self
            .http
            .post(DEPENDABOT_API)
            .header("Authorization", format!("Personal {}", self.token))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(ConfigOutcome::Created);
        }
        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && text.contains("already exists") {
            return Ok(ConfigOutcome::AlreadyExists);
        }
        bail!("status code {status}: {text}")
    }
}
