//! In-memory tab strip implementing [`TabHost`].
//!
//! Models the parts of a browser the engine depends on: per-window tab order,
//! contiguous tab groups, groups vanishing once their last tab leaves, and
//! stale references to closed tabs or removed groups. Every mutating call the
//! engine issues is recorded for inspection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use tabsort_types::{GroupColor, HostGroupId, HostGroupInfo, TabId, TabInfo, WindowId};

use crate::host::{GroupDisplay, HostError, HostFut, TabHost};

/// A mutating call the engine issued, in issue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    CreateOrExtendGroup {
        existing: Option<HostGroupId>,
        tabs: Vec<TabId>,
        /// `None` when the call failed.
        result: Option<HostGroupId>,
    },
    UpdateGroupDisplay {
        group: HostGroupId,
        title: String,
        color: Option<GroupColor>,
        collapsed: Option<bool>,
        ok: bool,
    },
    MoveGroup {
        group: HostGroupId,
        index: i64,
        ok: bool,
    },
}

/// Live host state loaded from JSON.
///
/// ```json
/// { "windows": [ { "id": 1,
///     "tabs": [ { "id": 10, "url": "https://a.com/", "group": 100 } ],
///     "groups": [ { "id": 100, "title": "A", "color": "blue" } ] } ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub windows: Vec<WindowInventory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowInventory {
    pub id: WindowId,
    #[serde(default)]
    pub tabs: Vec<InventoryTab>,
    #[serde(default)]
    pub groups: Vec<InventoryGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryTab {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub group: Option<HostGroupId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryGroup {
    pub id: HostGroupId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<GroupColor>,
    #[serde(default)]
    pub collapsed: bool,
}

#[derive(Debug, Default)]
struct Strip {
    order: BTreeMap<WindowId, Vec<TabId>>,
    tabs: HashMap<TabId, TabInfo>,
    groups: BTreeMap<HostGroupId, HostGroupInfo>,
    next_tab: i64,
    next_group: i64,
    calls: Vec<HostCall>,
}

impl Strip {
    fn tab(&self, tab: TabId) -> Result<&TabInfo, HostError> {
        self.tabs.get(&tab).ok_or(HostError::StaleTab(tab))
    }

    fn members(&self, window: WindowId, group: HostGroupId) -> Vec<TabId> {
        self.order
            .get(&window)
            .map(|order| {
                order
                    .iter()
                    .copied()
                    .filter(|tab| self.tabs.get(tab).and_then(|info| info.group_id) == Some(group))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Groups with no remaining tabs disappear.
    fn prune_empty_groups(&mut self) {
        let occupied: Vec<HostGroupId> = self.tabs.values().filter_map(|tab| tab.group_id).collect();
        self.groups.retain(|id, _| occupied.contains(id));
    }

    /// Lift `block` out of the window order and reinsert it contiguously at `index`.
    fn reinsert(&mut self, window: WindowId, block: &[TabId], index: Option<usize>) {
        let order = self.order.entry(window).or_default();
        order.retain(|tab| !block.contains(tab));
        let at = index.map_or(order.len(), |index| index.min(order.len()));
        order.splice(at..at, block.iter().copied());
    }

    fn group_tabs(
        &mut self,
        existing: Option<HostGroupId>,
        tabs: &[TabId],
    ) -> Result<HostGroupId, HostError> {
        let Some(&first) = tabs.first() else {
            return Err(HostError::Rejected("no tabs to group".to_string()));
        };
        let window = self.tab(first)?.window_id;
        for tab in tabs {
            if self.tab(*tab)?.window_id != window {
                return Err(HostError::Rejected(format!(
                    "tab {tab} is not in window {window}"
                )));
            }
        }

        let group = match existing {
            Some(id) => {
                let info = self.groups.get(&id).ok_or(HostError::StaleGroup(id))?;
                if info.window_id != window {
                    return Err(HostError::Rejected(format!(
                        "group {id} is not in window {window}"
                    )));
                }
                id
            }
            None => {
                self.next_group += 1;
                let id = HostGroupId::new(self.next_group);
                self.groups.insert(
                    id,
                    HostGroupInfo {
                        id,
                        window_id: window,
                        title: None,
                        color: None,
                        collapsed: false,
                    },
                );
                id
            }
        };

        let mut block = self.members(window, group);
        let anchor = block.first().copied().unwrap_or(first);
        let order = self.order.get(&window).cloned().unwrap_or_default();
        let anchor_at = order.iter().position(|tab| *tab == anchor).unwrap_or(order.len());

        for tab in tabs {
            if !block.contains(tab) {
                block.push(*tab);
            }
            if let Some(info) = self.tabs.get_mut(tab) {
                info.group_id = Some(group);
            }
        }
        let lifted_before = order[..anchor_at]
            .iter()
            .filter(|tab| block.contains(tab))
            .count();
        self.reinsert(window, &block, Some(anchor_at - lifted_before));
        self.prune_empty_groups();
        Ok(group)
    }

    fn update_display(&mut self, group: HostGroupId, display: &GroupDisplay) -> Result<(), HostError> {
        let info = self.groups.get_mut(&group).ok_or(HostError::StaleGroup(group))?;
        info.title = Some(display.title.clone());
        info.color = display.color;
        if let Some(collapsed) = display.collapsed {
            info.collapsed = collapsed;
        }
        Ok(())
    }

    fn move_group(&mut self, group: HostGroupId, index: i64) -> Result<(), HostError> {
        let window = self
            .groups
            .get(&group)
            .ok_or(HostError::StaleGroup(group))?
            .window_id;
        let block = self.members(window, group);
        let index = usize::try_from(index).ok();
        self.reinsert(window, &block, index);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SimulatedHost {
    strip: Mutex<Strip>,
}

impl SimulatedHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a host whose live state is `inventory`.
    pub fn from_inventory(inventory: &Inventory) -> Result<Self, HostError> {
        let mut strip = Strip::default();
        for window in &inventory.windows {
            strip.order.entry(window.id).or_default();
            for group in &window.groups {
                strip.groups.insert(
                    group.id,
                    HostGroupInfo {
                        id: group.id,
                        window_id: window.id,
                        title: group.title.clone(),
                        color: group.color,
                        collapsed: group.collapsed,
                    },
                );
                strip.next_group = strip.next_group.max(group.id.value());
            }
            for tab in &window.tabs {
                if strip.tabs.contains_key(&tab.id) {
                    return Err(HostError::Rejected(format!("duplicate tab id {}", tab.id)));
                }
                if let Some(group) = tab.group
                    && strip.groups.get(&group).map(|info| info.window_id) != Some(window.id)
                {
                    return Err(HostError::Rejected(format!(
                        "tab {} references group {group} outside window {}",
                        tab.id, window.id
                    )));
                }
                strip.tabs.insert(
                    tab.id,
                    TabInfo {
                        id: tab.id,
                        window_id: window.id,
                        url: tab.url.clone(),
                        group_id: tab.group,
                    },
                );
                strip.order.entry(window.id).or_default().push(tab.id);
                strip.next_tab = strip.next_tab.max(tab.id.value());
            }
        }
        strip.prune_empty_groups();
        Ok(Self {
            strip: Mutex::new(strip),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Strip> {
        self.strip.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a new ungrouped tab to `window`.
    pub fn open_tab(&self, window: WindowId, url: &str) -> TabId {
        let mut strip = self.lock();
        strip.next_tab += 1;
        let id = TabId::new(strip.next_tab);
        strip.tabs.insert(
            id,
            TabInfo {
                id,
                window_id: window,
                url: Some(url.to_string()),
                group_id: None,
            },
        );
        strip.order.entry(window).or_default().push(id);
        id
    }

    /// Change a tab's URL without notifying anyone.
    pub fn navigate(&self, tab: TabId, url: &str) -> Result<(), HostError> {
        let mut strip = self.lock();
        let info = strip.tabs.get_mut(&tab).ok_or(HostError::StaleTab(tab))?;
        info.url = Some(url.to_string());
        Ok(())
    }

    /// Close a tab as a user would. Returns `false` if it did not exist.
    pub fn close_tab(&self, tab: TabId) -> bool {
        let mut strip = self.lock();
        let Some(info) = strip.tabs.remove(&tab) else {
            return false;
        };
        if let Some(order) = strip.order.get_mut(&info.window_id) {
            order.retain(|id| *id != tab);
        }
        strip.prune_empty_groups();
        true
    }

    /// Ungroup every tab of `group` and drop it, as a user would.
    pub fn remove_group(&self, group: HostGroupId) -> bool {
        let mut strip = self.lock();
        if strip.groups.remove(&group).is_none() {
            return false;
        }
        for info in strip.tabs.values_mut() {
            if info.group_id == Some(group) {
                info.group_id = None;
            }
        }
        true
    }

    /// Create a titled group directly, bypassing the call log.
    pub fn seed_group(
        &self,
        title: &str,
        color: Option<GroupColor>,
        tabs: &[TabId],
    ) -> Result<HostGroupId, HostError> {
        let mut strip = self.lock();
        let id = strip.group_tabs(None, tabs)?;
        strip.update_display(
            id,
            &GroupDisplay {
                title: title.to_string(),
                color,
                collapsed: None,
            },
        )?;
        Ok(id)
    }

    #[must_use]
    pub fn group_info(&self, group: HostGroupId) -> Option<HostGroupInfo> {
        self.lock().groups.get(&group).cloned()
    }

    /// Tabs of `window` in order, each with its group's title (if grouped).
    #[must_use]
    pub fn strip(&self, window: WindowId) -> Vec<(TabId, Option<String>)> {
        let strip = self.lock();
        let Some(order) = strip.order.get(&window) else {
            return Vec::new();
        };
        order
            .iter()
            .map(|tab| {
                let title = strip
                    .tabs
                    .get(tab)
                    .and_then(|info| info.group_id)
                    .and_then(|group| strip.groups.get(&group))
                    .and_then(|info| info.title.clone());
                (*tab, title)
            })
            .collect()
    }

    /// Group titles of `window` in strip order, one entry per contiguous run.
    #[must_use]
    pub fn group_order(&self, window: WindowId) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for (_, title) in self.strip(window) {
            if let Some(title) = title
                && titles.last() != Some(&title)
            {
                titles.push(title);
            }
        }
        titles
    }

    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl TabHost for SimulatedHost {
    fn windows(&self) -> HostFut<'_, Vec<WindowId>> {
        Box::pin(async move { Ok(self.lock().order.keys().copied().collect()) })
    }

    fn tabs(&self, window: WindowId) -> HostFut<'_, Vec<TabInfo>> {
        Box::pin(async move {
            let strip = self.lock();
            let order = strip.order.get(&window).ok_or(HostError::UnknownWindow(window))?;
            Ok(order
                .iter()
                .filter_map(|tab| strip.tabs.get(tab).cloned())
                .collect())
        })
    }

    fn groups(&self, window: WindowId) -> HostFut<'_, Vec<HostGroupInfo>> {
        Box::pin(async move {
            let strip = self.lock();
            if !strip.order.contains_key(&window) {
                return Err(HostError::UnknownWindow(window));
            }
            Ok(strip
                .groups
                .values()
                .filter(|group| group.window_id == window)
                .cloned()
                .collect())
        })
    }

    fn tab(&self, tab: TabId) -> HostFut<'_, TabInfo> {
        Box::pin(async move { self.lock().tab(tab).cloned() })
    }

    fn create_or_extend_group<'a>(
        &'a self,
        existing: Option<HostGroupId>,
        tabs: &'a [TabId],
    ) -> HostFut<'a, HostGroupId> {
        Box::pin(async move {
            let mut strip = self.lock();
            let result = strip.group_tabs(existing, tabs);
            strip.calls.push(HostCall::CreateOrExtendGroup {
                existing,
                tabs: tabs.to_vec(),
                result: result.as_ref().ok().copied(),
            });
            result
        })
    }

    fn update_group_display<'a>(
        &'a self,
        group: HostGroupId,
        display: &'a GroupDisplay,
    ) -> HostFut<'a, ()> {
        Box::pin(async move {
            let mut strip = self.lock();
            let result = strip.update_display(group, display);
            strip.calls.push(HostCall::UpdateGroupDisplay {
                group,
                title: display.title.clone(),
                color: display.color,
                collapsed: display.collapsed,
                ok: result.is_ok(),
            });
            result
        })
    }

    fn move_group(&self, group: HostGroupId, index: i64) -> HostFut<'_, ()> {
        Box::pin(async move {
            let mut strip = self.lock();
            let result = strip.move_group(group, index);
            strip.calls.push(HostCall::MoveGroup {
                group,
                index,
                ok: result.is_ok(),
            });
            result
        })
    }
}
