//! Enforce a declarative repository access configuration against GitHub.
//!
//! ```text
//! GITHUB_TOKEN=... github-access --org my-org --team platform --access access.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use github_access::config;
use github_access::github::GithubClient;
use github_access::reconcile::Reconciler;

#[derive(Parser, Debug)]
#[command(
    name = "github-access",
    version,
    about = "Reconcile GitHub team permissions and app installations against a declarative access config"
)]
struct Cli {
    /// GitHub organization to reconcile.
    #[arg(long)]
    org: String,

    /// The main team; its admin access is implied, never declared.
    #[arg(long)]
    team: String,

    /// Path to the JSON access configuration.
    #[arg(long)]
    access: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let token =
        std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN environment variable is required")?;

    // A config error is fatal before any API call: the desired state cannot
    // be trusted.
    let groups = config::load(&cli.access)?;
    let desired = config::normalize(groups, &cli.team)?;

    let client = GithubClient::new(token)?;
    let errors = Reconciler::new(&client, &cli.org, &cli.team)
        .await?
        .run(&desired)
        .await?;

    if errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("error(s) were encountered - see above");
        Ok(ExitCode::FAILURE)
    }
}
