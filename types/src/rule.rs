//! Grouping rules as supplied by the configuration collaborator.
//!
//! Raw deserialization structs stay private here; a `Rule` that exists has a
//! non-empty group title. Regular expressions are NOT compiled at this
//! boundary: a malformed pattern is a per-match failure, not a load failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a rule's `match_content` is tested against a tab URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Exact comparison with the URL host (including a non-default port).
    Domain,
    /// Unanchored regular expression search over the whole URL.
    #[serde(alias = "regex")]
    RegExp,
}

impl MatchType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::RegExp => "regexp",
        }
    }
}

/// Colors a host tab group can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    #[serde(alias = "gray")]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
        }
    }
}

impl fmt::Display for GroupColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule group_title must not be empty")]
    EmptyGroupTitle,
}

#[derive(Deserialize)]
struct RawRule {
    id: Option<String>,
    name: Option<String>,
    group_title: String,
    #[serde(default)]
    priority: i64,
    group_color: Option<GroupColor>,
    match_type: MatchType,
    match_content: String,
    #[serde(default)]
    sort_index: i64,
}

/// A configured grouping rule.
///
/// Immutable once loaded for a reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    id: String,
    name: String,
    group_title: String,
    priority: i64,
    group_color: Option<GroupColor>,
    match_type: MatchType,
    match_content: String,
    sort_index: i64,
}

impl TryFrom<RawRule> for Rule {
    type Error = RuleError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        if raw.group_title.trim().is_empty() {
            return Err(RuleError::EmptyGroupTitle);
        }
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| raw.group_title.clone());
        let name = raw
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| raw.group_title.clone());
        Ok(Self {
            id,
            name,
            group_title: raw.group_title,
            priority: raw.priority,
            group_color: raw.group_color,
            match_type: raw.match_type,
            match_content: raw.match_content,
            sort_index: raw.sort_index,
        })
    }
}

impl Rule {
    pub fn new(
        group_title: impl Into<String>,
        match_type: MatchType,
        match_content: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::try_from(RawRule {
            id: None,
            name: None,
            group_title: group_title.into(),
            priority: 0,
            group_color: None,
            match_type,
            match_content: match_content.into(),
            sort_index: 0,
        })
    }

    /// Shorthand for a [`MatchType::Domain`] rule.
    pub fn domain(group_title: impl Into<String>, host: impl Into<String>) -> Result<Self, RuleError> {
        Self::new(group_title, MatchType::Domain, host)
    }

    /// Shorthand for a [`MatchType::RegExp`] rule.
    pub fn regexp(
        group_title: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::new(group_title, MatchType::RegExp, pattern)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_color(mut self, color: GroupColor) -> Self {
        self.group_color = Some(color);
        self
    }

    pub fn with_sort_index(mut self, sort_index: i64) -> Self {
        self.sort_index = sort_index;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn group_title(&self) -> &str {
        &self.group_title
    }

    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    #[must_use]
    pub fn group_color(&self) -> Option<GroupColor> {
        self.group_color
    }

    #[must_use]
    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    #[must_use]
    pub fn match_content(&self) -> &str {
        &self.match_content
    }

    #[must_use]
    pub fn sort_index(&self) -> i64 {
        self.sort_index
    }
}
