//! Picks reviewers, team reviewers and assignees from the configured
//! candidates.
//!
//! Everything here is pure apart from the [`Sampler`], which owns the only
//! source of randomness so callers can pin it down in tests.

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::config::{AssigneePolicy, Config, Groups};

/// Draws a random subset of candidates.
pub trait Sampler {
    /// Returns `amount` distinct entries of `candidates` in random order.
    /// Callers never ask for more than `candidates.len()`.
    fn sample(&mut self, candidates: Vec<String>, amount: usize) -> Vec<String>;
}

/// Uniform sampling without replacement backed by a [`Rng`].
#[derive(Debug, Clone)]
pub struct RandomSampler<R = ChaCha8Rng> {
    rng: R,
}

impl RandomSampler<ChaCha8Rng> {
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Sampler for RandomSampler<R> {
    fn sample(&mut self, mut candidates: Vec<String>, amount: usize) -> Vec<String> {
        let amount = amount.min(candidates.len());
        let (picked, _) = candidates.partial_shuffle(&mut self.rng, amount);
        picked.to_vec()
    }
}

/// Removes `exclude_user` from `candidates` and picks `desired_number` of the
/// rest; 0 keeps every remaining candidate in their original order.
pub fn choose_users(
    candidates: Option<&[String]>,
    desired_number: usize,
    exclude_user: Option<&str>,
    sampler: &mut dyn Sampler,
) -> Vec<String> {
    let Some(candidates) = candidates else {
        return Vec::new();
    };

    let filtered: Vec<String> = candidates
        .iter()
        .filter(|candidate| Some(candidate.as_str()) != exclude_user)
        .cloned()
        .collect();

    // all-assign
    if desired_number == 0 {
        return filtered;
    }

    let amount = desired_number.min(filtered.len());
    sampler.sample(filtered, amount)
}

/// Picks up to `desired_number` members from every group, in group order.
pub fn choose_users_from_groups(
    exclude_user: &str,
    groups: Option<&Groups>,
    desired_number: usize,
    sampler: &mut dyn Sampler,
) -> Vec<String> {
    let Some(groups) = groups else {
        return Vec::new();
    };

    groups
        .iter()
        .flat_map(|(_, members)| {
            choose_users(Some(members), desired_number, Some(exclude_user), sampler)
        })
        .collect()
}

fn active_groups(enabled: bool, groups: Option<&Groups>) -> Option<&Groups> {
    groups.filter(|groups| enabled && !groups.is_empty())
}

pub fn choose_reviewers(owner: &str, config: &Config, sampler: &mut dyn Sampler) -> Vec<String> {
    match active_groups(config.use_review_groups, config.review_groups.as_ref()) {
        Some(groups) => {
            choose_users_from_groups(owner, Some(groups), config.number_of_reviewers, sampler)
        }
        None => choose_users(
            config.reviewers.as_deref(),
            config.number_of_reviewers,
            Some(owner),
            sampler,
        ),
    }
}

/// Team slugs go through the same exclusion as users; it only bites when a
/// slug is literally the author's login.
pub fn choose_team_reviewers(
    owner: &str,
    config: &Config,
    sampler: &mut dyn Sampler,
) -> Vec<String> {
    match active_groups(
        config.use_team_review_groups,
        config.team_review_groups.as_ref(),
    ) {
        Some(groups) => choose_users_from_groups(
            owner,
            Some(groups),
            config.number_of_team_reviewers,
            sampler,
        ),
        None => choose_users(
            config.team_reviewers.as_deref(),
            config.number_of_team_reviewers,
            Some(owner),
            sampler,
        ),
    }
}

pub fn choose_assignees(
    owner: &str,
    config: &Config,
    policy: AssigneePolicy,
    sampler: &mut dyn Sampler,
) -> Vec<String> {
    match policy {
        AssigneePolicy::Disabled => Vec::new(),
        AssigneePolicy::AuthorOnly => vec![owner.to_string()],
        AssigneePolicy::All | AssigneePolicy::Enabled { .. } => {
            let desired_number = policy.desired_number();
            if let Some(groups) =
                active_groups(config.use_assignee_groups, config.assignee_groups.as_ref())
            {
                return choose_users_from_groups(owner, Some(groups), desired_number, sampler);
            }

            let pool = config
                .assignees
                .as_deref()
                .filter(|assignees| !assignees.is_empty())
                .or(config.reviewers.as_deref());
            choose_users(pool, desired_number, Some(owner), sampler)
        }
    }
}

/// Case-insensitive substring match of any keyword against the title.
pub fn includes_skip_keywords(title: &str, skip_keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    skip_keywords
        .iter()
        .any(|keyword| title.contains(&keyword.to_lowercase()))
}
