use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GroupColor, HostGroupId, TabId};

/// Position class of a group on the tab strip.
///
/// `Fixed` groups come first in ascending rank order; `Unranked` groups
/// follow, ordered by title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Fixed(i64),
    Unranked,
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Every `Fixed` rank orders before `Unranked`.
impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Rank::Fixed(a), Rank::Fixed(b)) => a.cmp(b),
            (Rank::Fixed(_), Rank::Unranked) => Ordering::Less,
            (Rank::Unranked, Rank::Fixed(_)) => Ordering::Greater,
            (Rank::Unranked, Rank::Unranked) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Fixed(index) => write!(f, "fixed({index})"),
            Rank::Unranked => f.write_str("unranked"),
        }
    }
}

/// In-memory state of one group within one window, keyed by `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupState {
    pub title: String,
    /// Set once the group exists on the host; cleared when the host removes it.
    pub host_id: Option<HostGroupId>,
    pub color: Option<GroupColor>,
    pub collapsed: bool,
    pub tab_ids: BTreeSet<TabId>,
    pub rank: Rank,
}

impl GroupState {
    /// Placeholder with no host id and no tabs.
    #[must_use]
    pub fn placeholder(title: impl Into<String>, rank: Rank, color: Option<GroupColor>) -> Self {
        Self {
            title: title.into(),
            host_id: None,
            color,
            collapsed: false,
            tab_ids: BTreeSet::new(),
            rank,
        }
    }

    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.tab_ids.len()
    }

    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.host_id.is_some()
    }
}
