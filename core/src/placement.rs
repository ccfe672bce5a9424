//! Tab-strip ordering of groups within one window.
//!
//! The strip is laid out as every `Fixed` group in ascending rank, then every
//! `Unranked` group in ascending title order. A group's placement index is the
//! number of tabs that must precede it.

use std::collections::BTreeMap;

use tabsort_types::{GroupState, Rank};

/// Extra trailing groups dropped from the prefix summed for an unranked
/// placement, on top of the slice ending at the successor group.
///
/// The fixed-rank branch has no such trim. The asymmetry is kept as observed
/// until the intended behavior is confirmed; see `unranked_prefix_trims_one_group`.
pub const UNRANKED_TRAILING_TRIM: usize = 1;

/// Where the host should move a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Tab-strip offset.
    Index(usize),
    /// Append after every other tab.
    End,
}

impl Placement {
    /// Host convention: `-1` appends.
    #[must_use]
    pub fn as_host_index(self) -> i64 {
        match self {
            Placement::Index(index) => index as i64,
            Placement::End => -1,
        }
    }
}

/// Groups in strip order. Equal fixed ranks fall back to title order.
#[must_use]
pub fn sorted_groups(groups: &BTreeMap<String, GroupState>) -> Vec<&GroupState> {
    let mut list: Vec<&GroupState> = groups.values().collect();
    // Map iteration is already title-ordered; a stable sort on rank keeps
    // titles ascending within each rank.
    list.sort_by(|a, b| a.rank.cmp(&b.rank));
    list
}

fn tab_total<'a>(groups: impl IntoIterator<Item = &'a GroupState>) -> usize {
    groups.into_iter().map(GroupState::tab_count).sum()
}

/// Offset a group with `rank` and `title` should occupy.
#[must_use]
pub fn placement_index(rank: Rank, title: &str, groups: &BTreeMap<String, GroupState>) -> Placement {
    match rank {
        Rank::Fixed(sort_index) => Placement::Index(tab_total(
            groups
                .values()
                .filter(|group| group.title != title)
                .filter(|group| matches!(group.rank, Rank::Fixed(other) if other < sort_index)),
        )),
        Rank::Unranked => {
            let sorted = sorted_groups(groups);
            let successor = sorted.iter().position(|group| {
                group.rank == Rank::Unranked && group.title.as_str() > title
            });
            match successor {
                None => Placement::End,
                Some(position) => {
                    let end = position.saturating_sub(UNRANKED_TRAILING_TRIM);
                    Placement::Index(tab_total(sorted[..end].iter().copied()))
                }
            }
        }
    }
}
