use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::types::Repo;

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

const DEFAULT_CONFIGURATION_PATH: &str = ".github/auto_assign.json";

/// Where the policy configuration is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The file at this path in the repository, at the triggering commit.
    Repository(String),
    /// A file on the local filesystem.
    Local(PathBuf),
}

/// Everything the binary needs to run one evaluation.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub repo_token: Option<String>,
    pub config_source: ConfigSource,
    pub event_path: PathBuf,
    pub repo: Option<Repo>,
    pub sha: Option<String>,
    pub api_url: Option<String>,
    pub seed: Option<u64>,
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "auto-assign",
    about = "Add reviewers, team reviewers and assignees to a pull request according to a configuration file"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// GitHub token (falls back to GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
    #[arg(long = "repo-token", value_name = "TOKEN")]
    pub repo_token: Option<String>,

    /// Path of the configuration file
    #[arg(
        long = "configuration-path",
        value_name = "PATH",
        default_value = DEFAULT_CONFIGURATION_PATH
    )]
    pub configuration_path: String,

    /// Read the configuration from the local filesystem instead of the repository
    #[arg(long = "local-config")]
    pub local_config: bool,

    /// Path of the webhook event payload
    #[arg(long = "event-path", env = "GITHUB_EVENT_PATH", value_name = "PATH")]
    pub event_path: PathBuf,

    /// Repository in format 'owner/repo' when the payload does not name one
    #[arg(short = 'r', long, env = "GITHUB_REPOSITORY", value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Commit to read the configuration file at
    #[arg(long, env = "GITHUB_SHA", value_name = "SHA")]
    pub sha: Option<String>,

    /// GitHub API base URL
    #[arg(long = "api-url", env = "GITHUB_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Seed for reviewer sampling (reproducible picks)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Log the requests instead of sending them
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn validate(&self) -> Result<()> {
        if self.configuration_path.trim().is_empty() {
            anyhow::bail!("--configuration-path must not be empty");
        }

        Ok(())
    }
}

fn create_run_spec(cli: CliArgs) -> Result<RunSpec> {
    cli.validate()?;

    let repo = cli
        .repo
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| Repo::parse(r).with_context(|| format!("Invalid repository format '{}'", r)))
        .transpose()?;

    let config_source = if cli.local_config {
        ConfigSource::Local(PathBuf::from(&cli.configuration_path))
    } else {
        ConfigSource::Repository(cli.configuration_path.clone())
    };

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    Ok(RunSpec {
        repo_token: non_empty(cli.repo_token),
        config_source,
        event_path: cli.event_path,
        repo,
        sha: non_empty(cli.sha),
        api_url: non_empty(cli.api_url),
        seed: cli.seed,
        dry_run: cli.dry_run,
    })
}

/// Parses command-line arguments (with environment fallbacks) into a [`RunSpec`].
pub fn parse_args<I, T>(args: I) -> Result<RunSpec>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    create_run_spec(cli)
}
