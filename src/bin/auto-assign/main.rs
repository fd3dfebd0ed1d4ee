mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use auto_assign::{
    Config, ConfigSource, DryRun, GitHub, Outcome, PullRequestEvent, RandomSampler, RunSpec,
    evaluate,
    config::load_config_file,
    github::{fetch_configuration_file, get_github_token, setup_github_client},
    parse_args,
};
use octocrab::Octocrab;
use output::publish_outputs;

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_event(spec: &RunSpec) -> Result<PullRequestEvent> {
    let payload = std::fs::read_to_string(&spec.event_path).with_context(|| {
        format!(
            "Failed to read webhook payload '{}'",
            spec.event_path.display()
        )
    })?;
    let event = PullRequestEvent::from_json(&payload).context("Failed to decode webhook payload")?;
    Ok(event.with_fallback_repo(spec.repo.as_ref()))
}

async fn load_config(
    spec: &RunSpec,
    event: &PullRequestEvent,
    client: Option<&Octocrab>,
) -> Result<Config> {
    match &spec.config_source {
        ConfigSource::Local(path) => load_config_file(path),
        ConfigSource::Repository(path) => {
            let client =
                client.context("A GitHub client is required to fetch the configuration file")?;
            let repo = event
                .repo()
                .context("Repository (--repo) is required to fetch the configuration file")?;
            fetch_configuration_file(client, &repo, path, spec.sha.as_deref()).await
        }
    }
}

async fn run(spec: &RunSpec) -> Result<Outcome> {
    let event = load_event(spec)?;
    let labels = event
        .pull_request
        .as_ref()
        .map(|pr| pr.label_names())
        .unwrap_or_default();

    let needs_client = !spec.dry_run || matches!(spec.config_source, ConfigSource::Repository(_));
    let client = if needs_client {
        let token = get_github_token(spec.repo_token.as_deref())
            .context("Failed to obtain GitHub authentication token")?;
        Some(setup_github_client(token, spec.api_url.as_deref()).await?)
    } else {
        None
    };

    let config = load_config(spec, &event, client.as_ref()).await?;
    let mut sampler = match spec.seed {
        Some(seed) => RandomSampler::seeded(seed),
        None => RandomSampler::from_entropy(),
    };

    let outcome = match client {
        Some(client) if !spec.dry_run => {
            evaluate(&event, &config, &GitHub::new(client, labels), &mut sampler).await?
        }
        _ => evaluate(&event, &config, &DryRun::new(labels), &mut sampler).await?,
    };

    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let spec = match parse_args(std::env::args()) {
        Ok(spec) => spec,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    let outcome = run(&spec).await?;
    let output_file = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from);
    publish_outputs(&outcome, output_file.as_deref())?;

    Ok(())
}
