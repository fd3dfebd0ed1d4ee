//! Auto-assign: reviewer and assignee automation for pull requests.
//!
//! Given a pull request event and a declarative configuration, decides
//! whether the pull request should be handled (skip keywords, draft state,
//! label filters), picks reviewers, team reviewers and assignees from flat
//! lists or groups, and applies them through a [`Collaborator`].

pub mod cli;
pub mod config;
pub mod errors;
pub mod github;
pub mod policy;
pub mod selection;
pub mod types;

pub use cli::{ConfigSource, RunSpec, parse_args};
pub use config::{AddAssignees, AssigneePolicy, Config, FilterLabels, Groups};
pub use errors::{ConfigError, PayloadError, PolicyError};
pub use github::{DryRun, GitHub};
pub use policy::{
    Assignment, Collaborator, Outcome, Phase, PhaseFailure, SkipReason, evaluate, to_mentions,
};
pub use selection::{
    RandomSampler, Sampler, choose_assignees, choose_reviewers, choose_team_reviewers,
    choose_users, choose_users_from_groups, includes_skip_keywords,
};
pub use types::{
    AuthorType, Label, PrIdentity, PullRequest, PullRequestEvent, Repo, RepoError, Repository,
    UserIdentity,
};
