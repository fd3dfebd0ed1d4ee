use thiserror::Error;

/// The event handed to the policy does not describe a pull request we can act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("the webhook payload is not exist")]
    MissingPullRequest,

    #[error("the webhook payload has no repository")]
    MissingRepository,
}

/// The policy configuration cannot be honoured as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "Error in configuration file to do with using {what}. Expected '{groups_key}' variable to be set because the variable '{use_key}' = true."
    )]
    MissingGroups {
        what: &'static str,
        use_key: &'static str,
        groups_key: &'static str,
    },

    #[error(
        "Error in configuration file to do with using addAssignees. Expected 'addAssignees' variable to be either boolean or 'author'"
    )]
    InvalidAddAssignees { value: String },
}

/// Errors that abort an evaluation before any mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = PolicyError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_message_matches_action_wording() {
        let err = PolicyError::from(PayloadError::MissingPullRequest);
        assert_eq!(err.to_string(), "the webhook payload is not exist");
    }

    #[test]
    fn missing_groups_names_both_keys() {
        let err = ConfigError::MissingGroups {
            what: "team review groups",
            use_key: "useTeamReviewGroups",
            groups_key: "teamReviewGroups",
        };
        assert_eq!(
            err.to_string(),
            "Error in configuration file to do with using team review groups. Expected 'teamReviewGroups' variable to be set because the variable 'useTeamReviewGroups' = true."
        );
    }
}
