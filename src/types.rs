use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while parsing an `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("repository must be in format 'owner/repo', got: '{0}'")]
    InvalidFormat(String),

    #[error("repository owner must not be empty")]
    EmptyOwner,

    #[error("repository name must not be empty")]
    EmptyName,
}

/// A GitHub repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        if owner.trim().is_empty() {
            return Err(RepoError::EmptyOwner);
        }
        if name.trim().is_empty() {
            return Err(RepoError::EmptyName);
        }
        Ok(Self { owner, name })
    }

    /// Parses the `owner/name` form used by `GITHUB_REPOSITORY` and `--repo`.
    pub fn parse(repo: &str) -> Result<Self, RepoError> {
        let parts: Vec<&str> = repo.trim().split('/').collect();
        match parts.as_slice() {
            [owner, name] => Self::new(*owner, *name),
            _ => Err(RepoError::InvalidFormat(repo.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Identifies the pull request every mutation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrIdentity {
    pub repo: Repo,
    pub number: u64,
}

impl fmt::Display for PrIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Categorises the GitHub account that opened a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorType {
    User,
    Bot,
    Organization,
    Unknown,
}

impl AuthorType {
    pub fn from_typename(typename: &str) -> Self {
        match typename {
            "User" => AuthorType::User,
            "Bot" => AuthorType::Bot,
            "Organization" => AuthorType::Organization,
            _ => AuthorType::Unknown,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, AuthorType::Bot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserIdentity {
    pub login: String,
    #[serde(rename = "type", default)]
    pub typename: Option<String>,
}

impl UserIdentity {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            typename: None,
        }
    }

    pub fn author_type(&self) -> AuthorType {
        self.typename
            .as_deref()
            .map_or(AuthorType::Unknown, AuthorType::from_typename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub name: String,
}

/// The subset of the `pull_request` webhook object the policy reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub draft: bool,
    pub user: UserIdentity,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    pub fn author(&self) -> &str {
        &self.user.login
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|label| label.name.clone()).collect()
    }

    pub fn has_any_label(&self, labels: &[String]) -> bool {
        self.labels.iter().any(|label| labels.contains(&label.name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: UserIdentity,
}

/// A `pull_request` (or `pull_request_target`) webhook event.
///
/// Both halves are optional because the action can be wired to events that
/// do not carry a pull request; the evaluator rejects those explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestEvent {
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
    #[serde(default)]
    pub repository: Option<Repository>,
}

impl PullRequestEvent {
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    pub fn repo(&self) -> Option<Repo> {
        self.repository
            .as_ref()
            .and_then(|r| Repo::new(r.owner.login.clone(), r.name.clone()).ok())
    }

    /// Fills in the repository from another source when the payload lacks one.
    pub fn with_fallback_repo(mut self, repo: Option<&Repo>) -> Self {
        if self.repository.is_none() {
            self.repository = repo.map(|r| Repository {
                name: r.name().to_string(),
                owner: UserIdentity::new(r.owner()),
            });
        }
        self
    }
}
