//! Resolved configuration types shared across crates.
//!
//! The TOML loader in `tabsort-config` resolves raw files into these types at
//! the parse boundary. Absence of configuration is represented by the empty
//! defaults here, never by `Option`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Rule;

/// Fallback-title settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Literal substrings stripped from fallback titles, first occurrence
    /// each, applied in list order.
    #[serde(default, alias = "remove_keywords")]
    pub remove_keyword_list: Vec<String>,
}

impl Settings {
    #[must_use]
    pub fn with_remove_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            remove_keyword_list: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Strip every configured keyword from `title`, cumulatively.
    #[must_use]
    pub fn strip_keywords(&self, title: &str) -> String {
        self.remove_keyword_list
            .iter()
            .fold(title.to_string(), |acc, keyword| acc.replacen(keyword.as_str(), "", 1))
    }
}

/// Hostname to display-name map used for fallback group titles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainAliasMap(HashMap<String, String>);

impl DomainAliasMap {
    /// Alias for `host`. Empty aliases count as absent.
    #[must_use]
    pub fn lookup(&self, host: &str) -> Option<&str> {
        self.0
            .get(host)
            .map(String::as_str)
            .filter(|alias| !alias.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DomainAliasMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(host, alias)| (host.into(), alias.into()))
                .collect(),
        )
    }
}

/// Everything the engine consumes from the configuration collaborator.
///
/// `Configuration::default()` is the empty configuration: every tab falls
/// back to domain-based unranked grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub rules: Vec<Rule>,
    pub settings: Settings,
    pub aliases: DomainAliasMap,
}
