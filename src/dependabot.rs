//! Dependabot onboarding: derives the package managers a repository needs
//! and provisions an update config for each.
//!
//! A detected language only counts when its manager's marker file sits at the
//! repository root, so a repo with a stray `.py` script does not get a `pip`
//! config. Docker is never reported by the languages API and is pulled in
//! purely by a root `Dockerfile`.

use std::collections::BTreeSet;

use tracing::info;

use crate::api::{ConfigOutcome, GithubApi, TeamRepo};
use crate::report::ErrorSink;

fn package_manager(language: &str) -> Option<&'static str> {
    match language {
        "Ruby" => Some("bundler"),
        "JavaScript" => Some("npm_and_yarn"),
        "Java" => Some("maven"),
        "Rust" => Some("cargo"),
        "PHP" => Some("composer"),
        "Python" => Some("pip"),
        "Elixir" => Some("hex"),
        "F#" | "C#" | "Visual Basic" => Some("nuget"),
        "Docker" => Some("docker"),
        _ => None,
    }
}

fn has_marker_files(language: &str, files: &[String]) -> bool {
    let has = |name: &str| files.iter().any(|file| file == name);
    match language {
        "Docker" => has("Dockerfile"),
        "Ruby" => has("Gemfile") || has("gemspec"),
        "JavaScript" => has("package.json"),
        "PHP" => has("composer.json"),
        "Python" => {
            has("requirements.txt") || has("setup.py") || (has("Pipfile") && has("Pipfile.lock"))
        }
        "Java" => has("pom.xml") || has("build.gradle"),
        "Rust" => has("Cargo.toml"),
        "Elixir" => has("mix.exs") && has("mix.lock"),
        _ => false,
    }
}

/// Package managers to provision for a repository, given its detected
/// languages and root file listing. Deduplicated and sorted.
pub fn package_managers(languages: &[String], files: &[String]) -> BTreeSet<&'static str> {
    let mut managers = BTreeSet::new();
    for language in languages {
        if let Some(manager) = package_manager(language) {
            if has_marker_files(language, files) {
                managers.insert(manager);
            }
        }
    }
    if has_marker_files("Docker", files) {
        managers.insert("docker");
    }
    managers
}

/// Submits one update-config request per applicable package manager.
///
/// Failures are reported through the sink and never abort the run; an
/// already-existing config is a benign no-op.
pub async fn provision(api: &dyn GithubApi, org: &str, repo: &TeamRepo, sink: &mut ErrorSink) {
    let languages = match api.list_repo_languages(org, &repo.name).await {
        Ok(languages) => languages,
        Err(err) => {
            sink.report(format!(
                "failed to list languages of repo {}: {err:#}",
                repo.name
            ));
            return;
        }
    };
    let files = match api.list_root_files(org, &repo.name).await {
        Ok(files) => files,
        Err(err) => {
            sink.report(format!(
                "failed to list root contents of repo {}: {err:#}",
                repo.name
            ));
            return;
        }
    };

    for manager in package_managers(&languages, &files) {
        match api.create_dependabot_config(repo.id, manager).await {
            Ok(ConfigOutcome::Created) => {
                info!("config for repo {}:{manager} added to Dependabot", repo.name);
            }
            Ok(ConfigOutcome::AlreadyExists) => {
                info!(
                    "config for repo {}:{manager} already exists in Dependabot",
                    repo.name
                );
            }
            Err(err) => {
                sink.report(format!(
                    "failed to add repo {}:{manager} to Dependabot ({err:#})",
                    repo.name
                ));
            }
        }
    }
}
