//! The host tab/group API the engine reconciles against.
//!
//! Every call is a suspension point. The engine awaits each call once and
//! never retries; a failed call fails that one operation only.

use std::future::Future;
use std::pin::Pin;

use tabsort_types::{GroupColor, HostGroupId, HostGroupInfo, TabId, TabInfo, WindowId};

/// Host call future type alias.
pub type HostFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, HostError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("tab {0} no longer exists")]
    StaleTab(TabId),
    #[error("tab group {0} no longer exists")]
    StaleGroup(HostGroupId),
    #[error("window {0} no longer exists")]
    UnknownWindow(WindowId),
    #[error("host rejected the call: {0}")]
    Rejected(String),
}

impl HostError {
    /// The call referenced something the user closed concurrently.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            HostError::StaleTab(_) | HostError::StaleGroup(_) | HostError::UnknownWindow(_)
        )
    }
}

/// Display state pushed to a host group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDisplay {
    pub title: String,
    pub color: Option<GroupColor>,
    /// `None` leaves the host's collapsed state untouched.
    pub collapsed: Option<bool>,
}

pub trait TabHost: Send + Sync {
    fn windows(&self) -> HostFut<'_, Vec<WindowId>>;

    /// Tabs of `window` in strip order.
    fn tabs(&self, window: WindowId) -> HostFut<'_, Vec<TabInfo>>;

    fn groups(&self, window: WindowId) -> HostFut<'_, Vec<HostGroupInfo>>;

    fn tab(&self, tab: TabId) -> HostFut<'_, TabInfo>;

    /// Put `tabs` into `existing`, or into a new group when `existing` is `None`.
    fn create_or_extend_group<'a>(
        &'a self,
        existing: Option<HostGroupId>,
        tabs: &'a [TabId],
    ) -> HostFut<'a, HostGroupId>;

    fn update_group_display<'a>(
        &'a self,
        group: HostGroupId,
        display: &'a GroupDisplay,
    ) -> HostFut<'a, ()>;

    /// Move a group so its first tab lands at `index`; `-1` appends.
    fn move_group(&self, group: HostGroupId, index: i64) -> HostFut<'_, ()>;
}
