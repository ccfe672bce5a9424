//! URL to group resolution.
//!
//! Rules are scanned in descending `priority`; equal priorities keep their
//! configured order. The first rule whose condition holds wins regardless of
//! its match type. With no winning rule the URL host (or its alias, minus the
//! configured keywords) becomes an unranked group title.

use regex::Regex;
use tracing::debug;
use url::Url;

use tabsort_types::{DomainAliasMap, GroupColor, MatchType, Rank, Rule, Settings};

#[derive(Debug, Clone, thiserror::Error)]
pub enum MatchError {
    #[error("rule '{rule_id}' has an invalid regular expression '{pattern}': {source}")]
    MalformedRule {
        rule_id: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Where a URL should be grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTarget {
    pub title: String,
    pub color: Option<GroupColor>,
    pub rank: Rank,
}

impl GroupTarget {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            title: rule.group_title().to_string(),
            color: rule.group_color(),
            rank: Rank::Fixed(rule.sort_index()),
        }
    }
}

#[derive(Debug)]
enum Condition {
    Domain,
    Pattern(Regex),
    Malformed(regex::Error),
}

#[derive(Debug)]
struct CompiledRule {
    rule: Rule,
    condition: Condition,
}

impl CompiledRule {
    fn new(rule: Rule) -> Self {
        let condition = match rule.match_type() {
            MatchType::Domain => Condition::Domain,
            MatchType::RegExp => match Regex::new(rule.match_content()) {
                Ok(regex) => Condition::Pattern(regex),
                Err(err) => Condition::Malformed(err),
            },
        };
        Self { rule, condition }
    }

    fn test(&self, url: &str, host: &str) -> Result<bool, MatchError> {
        match &self.condition {
            Condition::Domain => Ok(!host.is_empty() && host == self.rule.match_content()),
            Condition::Pattern(regex) => Ok(regex.is_match(url)),
            Condition::Malformed(err) => Err(MatchError::MalformedRule {
                rule_id: self.rule.id().to_string(),
                pattern: self.rule.match_content().to_string(),
                source: err.clone(),
            }),
        }
    }
}

/// Rules in scan order with their patterns compiled once per configuration.
///
/// A pattern that fails to compile is kept; it only fails a match attempt
/// when the scan actually reaches it.
#[derive(Debug, Default)]
pub struct RuleSet {
    entries: Vec<CompiledRule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(rules: &[Rule]) -> Self {
        let mut sorted = rules.to_vec();
        // `sort_by` is stable: equal priorities keep configured order.
        sorted.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Self {
            entries: sorted.into_iter().map(CompiledRule::new).collect(),
        }
    }

    /// Rules in the order they are scanned.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.entries.iter().map(|entry| &entry.rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rules whose pattern does not compile, with the compiler's complaint.
    pub fn malformed(&self) -> impl Iterator<Item = (&Rule, &regex::Error)> {
        self.entries.iter().filter_map(|entry| match &entry.condition {
            Condition::Malformed(err) => Some((&entry.rule, err)),
            _ => None,
        })
    }

    /// First rule in scan order whose condition holds for `url`.
    pub fn find(&self, url: &str, host: &str) -> Result<Option<&Rule>, MatchError> {
        for entry in &self.entries {
            if entry.test(url, host)? {
                return Ok(Some(&entry.rule));
            }
        }
        Ok(None)
    }
}

/// Host as a browser reports it: hostname plus any non-default port.
///
/// Returns `None` for strings that do not parse as absolute URLs.
#[must_use]
pub fn url_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str().unwrap_or_default();
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Domain-based target used when no rule applies.
#[must_use]
pub fn fallback_target(host: &str, settings: &Settings, aliases: &DomainAliasMap) -> GroupTarget {
    let base = aliases.lookup(host).unwrap_or(host);
    GroupTarget {
        title: settings.strip_keywords(base),
        color: None,
        rank: Rank::Unranked,
    }
}

/// Resolve the group for `url`.
///
/// `Ok(None)` means the URL cannot be grouped at all (unparseable, or no
/// host and no rule). A malformed pattern reached during the scan aborts
/// this attempt with [`MatchError::MalformedRule`]; callers decide whether to
/// fall back to [`fallback_target`].
pub fn resolve(
    url: &str,
    rules: &RuleSet,
    settings: &Settings,
    aliases: &DomainAliasMap,
) -> Result<Option<GroupTarget>, MatchError> {
    let Some(host) = url_host(url) else {
        debug!(url, "unparseable url, not grouping");
        return Ok(None);
    };

    if let Some(rule) = rules.find(url, &host)? {
        debug!(url, rule = rule.id(), title = rule.group_title(), "rule matched");
        return Ok(Some(GroupTarget::from_rule(rule)));
    }

    if host.is_empty() {
        return Ok(None);
    }
    Ok(Some(fallback_target(&host, settings, aliases)))
}

/// One-shot form of [`resolve`] over an unsorted rule list.
pub fn match_url(
    url: &str,
    rules: &[Rule],
    settings: &Settings,
    aliases: &DomainAliasMap,
) -> Result<Option<GroupTarget>, MatchError> {
    resolve(url, &RuleSet::new(rules), settings, aliases)
}
