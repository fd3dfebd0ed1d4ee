//! Decides whether a pull request gets reviewers and assignees, picks them,
//! and hands the result to a [`Collaborator`].

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    errors::{PayloadError, Result},
    selection::{
        Sampler, choose_assignees, choose_reviewers, choose_team_reviewers, includes_skip_keywords,
    },
    types::{PrIdentity, PullRequestEvent},
};

/// Mutations and lookups against the host repository.
#[async_trait]
pub trait Collaborator {
    async fn request_reviewers(
        &self,
        pr: &PrIdentity,
        reviewers: &[String],
        team_reviewers: &[String],
    ) -> anyhow::Result<()>;

    async fn add_assignees(&self, pr: &PrIdentity, assignees: &[String]) -> anyhow::Result<()>;

    async fn has_any_label(&self, pr: &PrIdentity, labels: &[String]) -> bool;
}

/// Why an evaluation stopped without touching the pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SkipKeyword,
    Draft,
    MissingIncludedLabel,
    HasExcludedLabel,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self {
            SkipReason::SkipKeyword => "PR title includes skip-keywords",
            SkipReason::Draft => "PR type is draft",
            SkipReason::MissingIncludedLabel => "PR is not tagged with any of the labels",
            SkipReason::HasExcludedLabel => "PR is tagged with any of the excluded labels",
        };
        write!(f, "Skips the process to add reviewers/assignees since {why}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reviewers,
    TeamReviewers,
    Assignees,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Reviewers => write!(f, "reviewers"),
            Phase::TeamReviewers => write!(f, "team reviewers"),
            Phase::Assignees => write!(f, "assignees"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub message: String,
}

/// What an evaluation applied. Lists hold only handles whose request succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub reviewers: Vec<String>,
    pub team_reviewers: Vec<String>,
    pub assignees: Vec<String>,
    pub failures: Vec<PhaseFailure>,
}

impl Assignment {
    fn settle(&mut self, phase: Phase, selected: Vec<String>, result: anyhow::Result<()>) {
        match result {
            Ok(()) => {
                info!(phase = %phase, users = ?selected, "added {phase}");
                match phase {
                    Phase::Reviewers => self.reviewers = selected,
                    Phase::TeamReviewers => self.team_reviewers = selected,
                    Phase::Assignees => self.assignees = selected,
                }
            }
            Err(err) => self.fail(phase, format!("{err:#}")),
        }
    }

    fn fail(&mut self, phase: Phase, message: String) {
        warn!(phase = %phase, "{message}");
        self.failures.push(PhaseFailure { phase, message });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Applied(Assignment),
}

/// Formats handles as GitHub mentions: `@a, @b`.
pub fn to_mentions(users: &[String]) -> String {
    users
        .iter()
        .map(|user| format!("@{user}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn skip(reason: SkipReason) -> Result<Outcome> {
    info!("{reason}");
    Ok(Outcome::Skipped(reason))
}

/// Runs the policy for one pull request event.
///
/// Payload and group-configuration problems abort before anything is
/// requested. The repository is only required once the skip and draft
/// checks have passed. Once the reviewer, team-reviewer and assignee phases start,
/// each one fails on its own: an error is logged and recorded in the
/// returned [`Assignment`] and the next phase still runs.
pub async fn evaluate<C>(
    event: &PullRequestEvent,
    config: &Config,
    collaborator: &C,
    sampler: &mut dyn Sampler,
) -> Result<Outcome>
where
    C: Collaborator + Sync + ?Sized,
{
    let pr = event
        .pull_request
        .as_ref()
        .ok_or(PayloadError::MissingPullRequest)?;
    let owner = pr.author();
    debug!(
        number = pr.number,
        author = owner,
        bot = pr.user.author_type().is_bot(),
        "evaluating pull request"
    );

    if includes_skip_keywords(&pr.title, &config.skip_keywords) {
        return skip(SkipReason::SkipKeyword);
    }

    if pr.draft && !config.run_on_draft {
        return skip(SkipReason::Draft);
    }

    config.validate()?;
    let assignee_policy = config.assignee_policy();

    let identity = PrIdentity {
        repo: event.repo().ok_or(PayloadError::MissingRepository)?,
        number: pr.number,
    };

    if let Some(filter) = config.label_filter() {
        if !filter.include.is_empty()
            && !collaborator.has_any_label(&identity, &filter.include).await
        {
            return skip(SkipReason::MissingIncludedLabel);
        }
        if !filter.exclude.is_empty()
            && collaborator.has_any_label(&identity, &filter.exclude).await
        {
            return skip(SkipReason::HasExcludedLabel);
        }
    }

    let mut assignment = Assignment::default();

    if config.add_reviewers {
        let reviewers = choose_reviewers(owner, config, sampler);
        if !reviewers.is_empty() {
            let result = collaborator
                .request_reviewers(&identity, &reviewers, &[])
                .await;
            assignment.settle(Phase::Reviewers, reviewers, result);
        }
    }

    if config.add_team_reviewers {
        let team_reviewers = choose_team_reviewers(owner, config, sampler);
        if !team_reviewers.is_empty() {
            let result = collaborator
                .request_reviewers(&identity, &[], &team_reviewers)
                .await;
            assignment.settle(Phase::TeamReviewers, team_reviewers, result);
        }
    }

    if config.add_assignees.is_requested() {
        match assignee_policy {
            Ok(policy) => {
                let assignees = choose_assignees(owner, config, policy, sampler);
                if !assignees.is_empty() {
                    let result = collaborator.add_assignees(&identity, &assignees).await;
                    assignment.settle(Phase::Assignees, assignees, result);
                }
            }
            Err(err) => assignment.fail(Phase::Assignees, err.to_string()),
        }
    }

    Ok(Outcome::Applied(assignment))
}
