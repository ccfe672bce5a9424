//! Per-window in-memory group state.
//!
//! Invariants maintained here:
//! - titles are unique within a window (they are the map key);
//! - a tab id sits in at most one group's `tab_ids` per window.
//!
//! Entries are never deleted by notifications; only [`GroupStateStore::clear`]
//! (a full rebuild) discards them.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use tabsort_types::{GroupColor, GroupState, HostGroupId, HostGroupInfo, Rank, Rule, TabId, WindowId};

use crate::matcher::GroupTarget;
use crate::placement::{self, Placement};

pub type WindowGroups = BTreeMap<String, GroupState>;

#[derive(Debug, Default)]
pub struct GroupStateStore {
    windows: HashMap<WindowId, WindowGroups>,
}

impl GroupStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every window and group.
    pub fn clear(&mut self) {
        self.windows.clear();
    }

    #[must_use]
    pub fn window_ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.windows.keys().copied().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn window(&self, window: WindowId) -> Option<&WindowGroups> {
        self.windows.get(&window)
    }

    pub fn get_or_create_window(&mut self, window: WindowId) -> &mut WindowGroups {
        self.windows.entry(window).or_default()
    }

    /// Existing group for `title`, or a fresh placeholder with `rank` and `color`.
    pub fn get_or_create_group(
        &mut self,
        window: WindowId,
        title: &str,
        rank: Rank,
        color: Option<GroupColor>,
    ) -> &mut GroupState {
        self.get_or_create_window(window)
            .entry(title.to_string())
            .or_insert_with(|| GroupState::placeholder(title, rank, color))
    }

    #[must_use]
    pub fn group(&self, window: WindowId, title: &str) -> Option<&GroupState> {
        self.windows.get(&window)?.get(title)
    }

    pub fn group_mut(&mut self, window: WindowId, title: &str) -> Option<&mut GroupState> {
        self.windows.get_mut(&window)?.get_mut(title)
    }

    /// Seed one fixed-rank placeholder per rule, in configured order.
    ///
    /// Rules sharing a title collapse into one entry; the later rule's rank
    /// and color win.
    pub fn seed_rules(&mut self, window: WindowId, rules: &[Rule]) {
        let groups = self.get_or_create_window(window);
        for rule in rules {
            groups.insert(
                rule.group_title().to_string(),
                GroupState::placeholder(
                    rule.group_title(),
                    Rank::Fixed(rule.sort_index()),
                    rule.group_color(),
                ),
            );
        }
    }

    /// Merge a live host group into the window.
    ///
    /// A seeded title gains the host id and keeps its rank; any other titled
    /// group is adopted as unranked with no tabs. Untitled groups are ignored.
    pub fn adopt_host_group(&mut self, info: &HostGroupInfo) {
        let Some(title) = info.title.as_deref().filter(|title| !title.is_empty()) else {
            debug!(group = %info.id, "ignoring untitled host group");
            return;
        };
        let groups = self.get_or_create_window(info.window_id);
        match groups.get_mut(title) {
            Some(existing) => existing.host_id = Some(info.id),
            None => {
                let mut adopted = GroupState::placeholder(title, Rank::Unranked, info.color);
                adopted.host_id = Some(info.id);
                adopted.collapsed = info.collapsed;
                groups.insert(title.to_string(), adopted);
            }
        }
    }

    /// Record `tab` as a member of the group `target` resolves to.
    ///
    /// The tab leaves any other group in the window first.
    pub fn assign_tab(&mut self, window: WindowId, tab: TabId, target: &GroupTarget) -> &mut GroupState {
        let groups = self.get_or_create_window(window);
        for (title, group) in groups.iter_mut() {
            if *title != target.title && group.tab_ids.remove(&tab) {
                debug!(%window, %tab, from = %title, to = %target.title, "tab changed group");
            }
        }
        let group = groups
            .entry(target.title.clone())
            .or_insert_with(|| GroupState::placeholder(&target.title, target.rank, target.color));
        group.tab_ids.insert(tab);
        group
    }

    /// Remove `tab` from every group in the window. Returns the titles it left.
    pub fn remove_tab(&mut self, window: WindowId, tab: TabId) -> Vec<String> {
        let Some(groups) = self.windows.get_mut(&window) else {
            return Vec::new();
        };
        groups
            .values_mut()
            .filter_map(|group| group.tab_ids.remove(&tab).then(|| group.title.clone()))
            .collect()
    }

    /// The group currently holding `tab`, if any.
    #[must_use]
    pub fn owner_of(&self, window: WindowId, tab: TabId) -> Option<&GroupState> {
        self.windows
            .get(&window)?
            .values()
            .find(|group| group.tab_ids.contains(&tab))
    }

    /// The host removed a group: forget its id and members, keep the entry.
    ///
    /// Returns `false` when no materialized group carries `title`.
    pub fn on_group_removed(&mut self, window: WindowId, title: &str) -> bool {
        match self.group_mut(window, title) {
            Some(group) if group.host_id.is_some() => {
                group.host_id = None;
                group.tab_ids.clear();
                true
            }
            _ => false,
        }
    }

    /// The host changed a group's display state; host values win.
    ///
    /// Only applies to groups already bound to a host id.
    pub fn on_group_updated(
        &mut self,
        window: WindowId,
        title: &str,
        color: Option<GroupColor>,
        host_id: HostGroupId,
        collapsed: bool,
    ) -> bool {
        match self.group_mut(window, title) {
            Some(group) if group.host_id.is_some() => {
                group.color = color;
                group.host_id = Some(host_id);
                group.collapsed = collapsed;
                true
            }
            _ => false,
        }
    }

    /// Groups of `window` in strip order.
    #[must_use]
    pub fn sorted_groups(&self, window: WindowId) -> Vec<&GroupState> {
        self.windows
            .get(&window)
            .map(placement::sorted_groups)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn placement_index(&self, window: WindowId, rank: Rank, title: &str) -> Placement {
        match self.windows.get(&window) {
            Some(groups) => placement::placement_index(rank, title, groups),
            None => Placement::End,
        }
    }
}
