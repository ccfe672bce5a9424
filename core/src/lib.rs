//! Core grouping logic for tabsort.
//!
//! Synchronous and host-agnostic: rule matching, strip placement, and the
//! per-window group state the engine reconciles against the host.

pub mod matcher;
pub mod placement;
pub mod store;

pub use matcher::{GroupTarget, MatchError, RuleSet, fallback_target, match_url, resolve, url_host};
pub use placement::{Placement, UNRANKED_TRAILING_TRIM, placement_index, sorted_groups};
pub use store::{GroupStateStore, WindowGroups};
