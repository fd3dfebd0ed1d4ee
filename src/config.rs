//! Policy configuration as written in the repository's configuration file.
//!
//! The document is JSON with camelCase keys. Every key is optional; absent
//! booleans are false, absent counts are 0 and absent lists are empty.

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use serde::{
    Deserialize, Deserializer,
    de::{IgnoredAny, MapAccess, Visitor},
};
use serde_json::Value;

use crate::errors::ConfigError;

/// Accepts a list of handles, treating any other shape as absent.
fn lenient_handles<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        List(Vec<String>),
        Other(IgnoredAny),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::List(handles) => Some(handles),
        Lenient::Other(_) => None,
    })
}

/// Like [`lenient_handles`], with absent meaning empty.
fn lenient_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_handles(deserializer)?.unwrap_or_default())
}

/// Named groups of handles, iterated in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups(Vec<(String, Vec<String>)>);

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group, replacing the members of an existing group with the same
    /// name while keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, members: Vec<String>) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = members,
            None => self.0.push((name, members)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N, M> FromIterator<(N, Vec<M>)> for Groups
where
    N: Into<String>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, Vec<M>)>>(iter: I) -> Self {
        let mut groups = Groups::new();
        for (name, members) in iter {
            groups.insert(name, members.into_iter().map(Into::into).collect());
        }
        groups
    }
}

impl<'de> Deserialize<'de> for Groups {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Members(Vec<String>);

        impl<'de> Deserialize<'de> for Members {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                lenient_list(deserializer).map(Members)
            }
        }

        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = Groups;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from group name to a list of handles")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Groups, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups = Groups::new();
                while let Some((name, Members(members))) = map.next_entry::<String, Members>()? {
                    groups.insert(name, members);
                }
                Ok(groups)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// `addAssignees` is either a switch or the literal mode `"author"`.
///
/// Any other JSON value is kept as written so that only the assignee phase
/// rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AddAssignees {
    Flag(bool),
    Mode(String),
    Other(Value),
}

impl Default for AddAssignees {
    fn default() -> Self {
        AddAssignees::Flag(false)
    }
}

impl AddAssignees {
    /// Whether the assignee phase runs at all. An empty mode string counts as off.
    pub fn is_requested(&self) -> bool {
        match self {
            AddAssignees::Flag(enabled) => *enabled,
            AddAssignees::Mode(mode) => !mode.is_empty(),
            AddAssignees::Other(Value::Null) => false,
            AddAssignees::Other(Value::Number(n)) => n.as_f64() != Some(0.0),
            AddAssignees::Other(_) => true,
        }
    }
}

/// How assignees are chosen, derived once from `addAssignees` and the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneePolicy {
    Disabled,
    /// Assign the pull request author and nobody else.
    AuthorOnly,
    /// Assign every remaining candidate.
    All,
    Enabled {
        count: usize,
    },
}

impl AssigneePolicy {
    /// Count handed to the selection engine; 0 means everyone.
    pub fn desired_number(&self) -> usize {
        match self {
            AssigneePolicy::Enabled { count } => *count,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterLabels {
    #[serde(deserialize_with = "lenient_list")]
    pub include: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub add_reviewers: bool,
    pub add_team_reviewers: bool,
    pub add_assignees: AddAssignees,

    #[serde(deserialize_with = "lenient_handles")]
    pub reviewers: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_handles")]
    pub team_reviewers: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_handles")]
    pub assignees: Option<Vec<String>>,

    pub number_of_reviewers: usize,
    pub number_of_team_reviewers: usize,
    pub number_of_assignees: usize,

    pub use_review_groups: bool,
    pub use_team_review_groups: bool,
    pub use_assignee_groups: bool,
    pub review_groups: Option<Groups>,
    pub team_review_groups: Option<Groups>,
    pub assignee_groups: Option<Groups>,

    #[serde(deserialize_with = "lenient_list")]
    pub skip_keywords: Vec<String>,
    pub filter_labels: Option<FilterLabels>,
    /// Older configurations listed include labels at the top level.
    #[serde(deserialize_with = "lenient_list")]
    pub labels: Vec<String>,
    pub run_on_draft: bool,
}

impl Config {
    pub fn from_json(document: &str) -> serde_json::Result<Self> {
        serde_json::from_str(document)
    }

    /// Checks that every enabled group mode has its group map.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let checks = [
            (
                self.use_review_groups,
                self.review_groups.is_some(),
                "review groups",
                "useReviewGroups",
                "reviewGroups",
            ),
            (
                self.use_team_review_groups,
                self.team_review_groups.is_some(),
                "team review groups",
                "useTeamReviewGroups",
                "teamReviewGroups",
            ),
            (
                self.use_assignee_groups,
                self.assignee_groups.is_some(),
                "review groups",
                "useAssigneeGroups",
                "assigneeGroups",
            ),
        ];

        for (enabled, present, what, use_key, groups_key) in checks {
            if enabled && !present {
                return Err(ConfigError::MissingGroups {
                    what,
                    use_key,
                    groups_key,
                });
            }
        }

        Ok(())
    }

    /// `numberOfAssignees`, falling back to `numberOfReviewers` when it is 0.
    ///
    /// An explicit `numberOfAssignees: 0` is indistinguishable from an absent
    /// one and therefore also defers to `numberOfReviewers`.
    pub fn assignee_count(&self) -> usize {
        if self.number_of_assignees != 0 {
            self.number_of_assignees
        } else {
            self.number_of_reviewers
        }
    }

    pub fn assignee_policy(&self) -> std::result::Result<AssigneePolicy, ConfigError> {
        match &self.add_assignees {
            AddAssignees::Flag(false) => Ok(AssigneePolicy::Disabled),
            AddAssignees::Mode(mode) if mode.is_empty() => Ok(AssigneePolicy::Disabled),
            AddAssignees::Mode(mode) if mode == "author" => Ok(AssigneePolicy::AuthorOnly),
            AddAssignees::Mode(mode) => Err(ConfigError::InvalidAddAssignees {
                value: mode.clone(),
            }),
            AddAssignees::Other(_) if !self.add_assignees.is_requested() => {
                Ok(AssigneePolicy::Disabled)
            }
            AddAssignees::Other(value) => Err(ConfigError::InvalidAddAssignees {
                value: value.to_string(),
            }),
            AddAssignees::Flag(true) => match self.assignee_count() {
                0 => Ok(AssigneePolicy::All),
                count => Ok(AssigneePolicy::Enabled { count }),
            },
        }
    }

    /// Label filters to apply, folding the top-level `labels` key into
    /// `include` when `filterLabels.include` is not set.
    pub fn label_filter(&self) -> Option<FilterLabels> {
        match (&self.filter_labels, self.labels.is_empty()) {
            (None, true) => None,
            (None, false) => Some(FilterLabels {
                include: self.labels.clone(),
                exclude: Vec::new(),
            }),
            (Some(filter), _) => {
                let mut filter = filter.clone();
                if filter.include.is_empty() {
                    filter.include = self.labels.clone();
                }
                Some(filter)
            }
        }
    }
}

/// Decodes a configuration document, rejecting one that holds no settings.
pub fn parse_config_document(document: &str) -> Result<Config> {
    let value: serde_json::Value =
        serde_json::from_str(document).context("the configuration file failed to load")?;
    if value.is_null() {
        anyhow::bail!("the configuration file failed to load");
    }
    serde_json::from_value(value).context("the configuration file failed to load")
}

/// Reads a configuration document from the local filesystem.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'", path.display()))?;
    if document.trim().is_empty() {
        anyhow::bail!("the configuration file is not found");
    }
    parse_config_document(&document)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert!(!config.add_reviewers);
        assert!(!config.add_assignees.is_requested());
        assert_eq!(config.reviewers, None);
        assert_eq!(config.number_of_reviewers, 0);
        assert!(!config.run_on_draft);
        assert_eq!(config.label_filter(), None);
    }

    #[test]
    fn groups_keep_document_order() {
        let config = Config::from_json(
            r#"{ "reviewGroups": { "zeta": ["z1"], "alpha": ["a1", "a2"], "mid": [] } }"#,
        )
        .unwrap();
        let names: Vec<&str> = config
            .review_groups
            .as_ref()
            .unwrap()
            .iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn non_list_candidates_are_treated_as_absent() {
        let config = Config::from_json(
            r#"{ "reviewers": "reviewer1", "teamReviewers": 3, "assignees": ["a"] }"#,
        )
        .unwrap();
        assert_eq!(config.reviewers, None);
        assert_eq!(config.team_reviewers, None);
        assert_eq!(config.assignees, Some(vec!["a".to_string()]));
    }

    #[test]
    fn add_assignees_accepts_bool_or_string() {
        let config = Config::from_json(r#"{ "addAssignees": "author" }"#).unwrap();
        assert_eq!(config.assignee_policy(), Ok(AssigneePolicy::AuthorOnly));

        let config = Config::from_json(r#"{ "addAssignees": "test" }"#).unwrap();
        assert!(config.add_assignees.is_requested());
        assert_eq!(
            config.assignee_policy(),
            Err(ConfigError::InvalidAddAssignees {
                value: "test".into()
            })
        );

        let config = Config::from_json(r#"{ "addAssignees": "" }"#).unwrap();
        assert!(!config.add_assignees.is_requested());
        assert_eq!(config.assignee_policy(), Ok(AssigneePolicy::Disabled));
    }

    #[test]
    fn add_assignees_of_another_shape_fails_only_the_policy() {
        let config =
            Config::from_json(r#"{ "addReviewers": true, "reviewers": ["a"], "addAssignees": 1 }"#)
                .unwrap();
        assert!(config.add_reviewers);
        assert!(config.add_assignees.is_requested());
        assert_eq!(
            config.assignee_policy(),
            Err(ConfigError::InvalidAddAssignees { value: "1".into() })
        );

        let config = Config::from_json(r#"{ "addAssignees": ["someone"] }"#).unwrap();
        assert!(config.assignee_policy().is_err());

        for falsy in ["null", "0"] {
            let config = Config::from_json(&format!(r#"{{ "addAssignees": {falsy} }}"#)).unwrap();
            assert!(!config.add_assignees.is_requested());
            assert_eq!(config.assignee_policy(), Ok(AssigneePolicy::Disabled));
        }
    }

    #[test]
    fn null_keyword_and_label_lists_are_empty() {
        let config = Config::from_json(
            r#"{ "skipKeywords": null, "labels": null,
                 "filterLabels": { "include": null, "exclude": ["wip"] } }"#,
        )
        .unwrap();
        assert!(config.skip_keywords.is_empty());
        assert_eq!(
            config.label_filter(),
            Some(FilterLabels {
                include: vec![],
                exclude: vec!["wip".into()],
            })
        );

        let config = Config::from_json(r#"{ "reviewGroups": { "groupA": null } }"#).unwrap();
        let groups = config.review_groups.unwrap();
        let members: Vec<&[String]> = groups.iter().map(|(_, members)| members).collect();
        assert_eq!(members, vec![&[] as &[String]]);
    }

    #[test]
    fn assignee_count_falls_back_to_reviewer_count() {
        let config = Config::from_json(
            r#"{ "addAssignees": true, "numberOfReviewers": 2, "numberOfAssignees": 0 }"#,
        )
        .unwrap();
        assert_eq!(config.assignee_policy(), Ok(AssigneePolicy::Enabled { count: 2 }));

        let config = Config::from_json(r#"{ "addAssignees": true, "numberOfAssignees": 1 }"#)
            .unwrap();
        assert_eq!(config.assignee_policy(), Ok(AssigneePolicy::Enabled { count: 1 }));

        let config = Config::from_json(r#"{ "addAssignees": true }"#).unwrap();
        assert_eq!(config.assignee_policy(), Ok(AssigneePolicy::All));
    }

    #[test]
    fn validate_reports_first_missing_group_map() {
        let config = Config::from_json(r#"{ "useReviewGroups": true }"#).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingGroups {
                what: "review groups",
                use_key: "useReviewGroups",
                groups_key: "reviewGroups",
            })
        );

        let config =
            Config::from_json(r#"{ "useAssigneeGroups": true, "assigneeGroups": null }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingGroups {
                groups_key: "assigneeGroups",
                ..
            })
        ));

        let config = Config::from_json(r#"{ "useTeamReviewGroups": true, "teamReviewGroups": {} }"#)
            .unwrap();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn legacy_labels_become_include_filter() {
        let config = Config::from_json(r#"{ "labels": ["test_label"] }"#).unwrap();
        assert_eq!(
            config.label_filter(),
            Some(FilterLabels {
                include: vec!["test_label".into()],
                exclude: vec![],
            })
        );

        let config = Config::from_json(
            r#"{ "labels": ["legacy"], "filterLabels": { "include": ["new"], "exclude": ["wip"] } }"#,
        )
        .unwrap();
        assert_eq!(
            config.label_filter(),
            Some(FilterLabels {
                include: vec!["new".into()],
                exclude: vec!["wip".into()],
            })
        );
    }

    #[test]
    fn parse_config_document_rejects_null() {
        let err = parse_config_document("null").unwrap_err();
        assert_eq!(err.to_string(), "the configuration file failed to load");
        assert!(parse_config_document(r#"{ "addReviewers": true }"#).is_ok());
    }

    #[test]
    fn load_config_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto_assign.json");
        std::fs::write(&path, r#"{ "addReviewers": true, "reviewers": ["a", "b"] }"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert!(config.add_reviewers);
        assert_eq!(config.reviewers, Some(vec!["a".into(), "b".into()]));

        std::fs::write(&path, "   ").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert_eq!(err.to_string(), "the configuration file is not found");
    }
}
