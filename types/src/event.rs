//! Host notifications and live inventory records.

use serde::{Deserialize, Serialize};

use crate::{GroupColor, HostGroupId, TabId, WindowId};

/// A tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    /// `None` while the host has not resolved a URL for the tab yet.
    pub url: Option<String>,
    /// Host group the tab currently sits in, if any.
    #[serde(default)]
    pub group_id: Option<HostGroupId>,
}

/// A physical tab group as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroupInfo {
    pub id: HostGroupId,
    pub window_id: WindowId,
    /// Untitled host groups are ignored by bootstrap.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: Option<GroupColor>,
    #[serde(default)]
    pub collapsed: bool,
}

/// Notifications delivered to the reconciliation entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A tab was created or updated. Only updates carrying a URL matter.
    TabAdded {
        tab_id: TabId,
        #[serde(default)]
        url: Option<String>,
    },
    TabRemoved {
        tab_id: TabId,
        window_id: WindowId,
    },
    GroupRemoved {
        window_id: WindowId,
        title: String,
    },
    GroupUpdated {
        window_id: WindowId,
        title: String,
        #[serde(default)]
        color: Option<GroupColor>,
        host_group_id: HostGroupId,
        #[serde(default)]
        collapsed: bool,
    },
    ReloadRequested,
}

impl HostEvent {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::TabAdded { .. } => "tab_added",
            HostEvent::TabRemoved { .. } => "tab_removed",
            HostEvent::GroupRemoved { .. } => "group_removed",
            HostEvent::GroupUpdated { .. } => "group_updated",
            HostEvent::ReloadRequested => "reload_requested",
        }
    }
}

/// Acknowledgement returned once a reload has rebuilt all state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadAck {
    pub windows: usize,
    pub groups: usize,
    /// Host operations that failed during the rebuild (not retried).
    pub failures: usize,
}
