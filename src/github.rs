use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    config::{Config, parse_config_document},
    policy::Collaborator,
    types::{PrIdentity, Repo},
};

/// Resolves a token from `explicit`, then the environment, then the gh CLI.
pub fn get_github_token(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    // Prefer environment variables over gh CLI to avoid subprocess overhead.
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        return Ok(token);
    }

    if let Ok(token) = std::env::var("GH_TOKEN") {
        return Ok(token);
    }

    let output = Command::new("gh").args(["auth", "token"]).output()?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    let token = String::from_utf8(output.stdout)?.trim().to_string();

    if token.is_empty() {
        anyhow::bail!("Empty token returned from gh CLI");
    }

    Ok(token)
}

/// Creates an authenticated GitHub client, optionally against a non-default API host.
pub async fn setup_github_client(token: String, api_url: Option<&str>) -> Result<Octocrab> {
    let mut builder = Octocrab::builder().personal_token(token);
    if let Some(api_url) = api_url {
        builder = builder
            .base_uri(api_url)
            .with_context(|| format!("Invalid GitHub API URL: '{}'", api_url))?;
    }
    builder.build().context("Failed to create GitHub client")
}

/// Body for `POST /pulls/{n}/requested_reviewers`; empty lists are left out.
pub fn review_request_body(reviewers: &[String], team_reviewers: &[String]) -> Value {
    let mut body = Map::new();
    if !reviewers.is_empty() {
        body.insert("reviewers".into(), Value::from(reviewers.to_vec()));
    }
    if !team_reviewers.is_empty() {
        body.insert("team_reviewers".into(), Value::from(team_reviewers.to_vec()));
    }
    Value::Object(body)
}

fn labels_overlap(pr_labels: &[String], wanted: &[String]) -> bool {
    pr_labels.iter().any(|label| wanted.contains(label))
}

/// Collaborator that applies changes through the GitHub REST API.
///
/// Label checks read the labels carried by the triggering event rather than
/// fetching them again.
pub struct GitHub {
    client: Octocrab,
    labels: Vec<String>,
}

impl GitHub {
    pub fn new(client: Octocrab, labels: Vec<String>) -> Self {
        Self { client, labels }
    }
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Collaborator for GitHub {
    async fn request_reviewers(
        &self,
        pr: &PrIdentity,
        reviewers: &[String],
        team_reviewers: &[String],
    ) -> Result<()> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/requested_reviewers",
            pr.repo.owner(),
            pr.repo.name(),
            pr.number
        );
        let body = review_request_body(reviewers, team_reviewers);

        let result: Value = self
            .client
            .post(route, Some(&body))
            .await
            .with_context(|| format!("Failed to request reviewers on {}", pr))?;
        debug!(%result, "requested reviewers");
        Ok(())
    }

    async fn add_assignees(&self, pr: &PrIdentity, assignees: &[String]) -> Result<()> {
        let route = format!(
            "/repos/{}/{}/issues/{}/assignees",
            pr.repo.owner(),
            pr.repo.name(),
            pr.number
        );
        let body = serde_json::json!({ "assignees": assignees });

        let result: Value = self
            .client
            .post(route, Some(&body))
            .await
            .with_context(|| format!("Failed to add assignees on {}", pr))?;
        debug!(%result, "added assignees");
        Ok(())
    }

    async fn has_any_label(&self, _pr: &PrIdentity, labels: &[String]) -> bool {
        labels_overlap(&self.labels, labels)
    }
}

/// Collaborator that only logs what would have been requested.
#[derive(Debug, Default)]
pub struct DryRun {
    labels: Vec<String>,
}

impl DryRun {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl Collaborator for DryRun {
    async fn request_reviewers(
        &self,
        pr: &PrIdentity,
        reviewers: &[String],
        team_reviewers: &[String],
    ) -> Result<()> {
        info!(
            pr = %pr,
            body = %review_request_body(reviewers, team_reviewers),
            "dry run: would request reviewers"
        );
        Ok(())
    }

    async fn add_assignees(&self, pr: &PrIdentity, assignees: &[String]) -> Result<()> {
        info!(pr = %pr, ?assignees, "dry run: would add assignees");
        Ok(())
    }

    async fn has_any_label(&self, _pr: &PrIdentity, labels: &[String]) -> bool {
        labels_overlap(&self.labels, labels)
    }
}

/// Turns the decoded contents of the configuration file into a [`Config`].
pub fn config_from_content(content: Option<String>) -> Result<Config> {
    let document = content
        .filter(|document| !document.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("the configuration file is not found"))?;
    parse_config_document(&document)
}

/// Reads the configuration file from the repository at `reference`.
pub async fn fetch_configuration_file(
    client: &Octocrab,
    repo: &Repo,
    path: &str,
    reference: Option<&str>,
) -> Result<Config> {
    let handler = client.repos(repo.owner(), repo.name());
    let mut request = handler.get_content().path(path);
    if let Some(reference) = reference.filter(|r| !r.is_empty()) {
        request = request.r#ref(reference);
    }

    let contents = request
        .send()
        .await
        .with_context(|| format!("Failed to fetch '{}' from {}", path, repo))?;

    config_from_content(
        contents
            .items
            .into_iter()
            .next()
            .and_then(|item| item.decoded_content()),
    )
}
