//! Core domain types for tabsort.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod event;
mod group;
mod ids;
mod rule;
mod settings;

pub use event::{HostEvent, HostGroupInfo, ReloadAck, TabInfo};
pub use group::{GroupState, Rank};
pub use ids::{HostGroupId, TabId, WindowId};
pub use rule::{GroupColor, MatchType, Rule, RuleError};
pub use settings::{Configuration, DomainAliasMap, Settings};
