//! Full rebuild of group state from the live host.
//!
//! Per window:
//! 1. seed one placeholder per configured rule,
//! 2. adopt titled host groups (binding ids to seeded titles),
//! 3. assign every tab with a URL in memory only,
//! 4. push each non-empty group to the host in strip order.
//!
//! Rebuilding is idempotent: the store is cleared first and the result
//! depends only on the host and the configuration.

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use tabsort_types::{HostGroupId, TabId, WindowId};

use crate::host::{GroupDisplay, TabHost};
use crate::state::{BootstrapReport, HostSync, WindowPhase};
use crate::{EngineError, ReconciliationEngine};

impl<H: TabHost> ReconciliationEngine<H> {
    /// Rebuild every window from the host.
    ///
    /// Only failing to list windows aborts. Everything after that is
    /// collected into the report and the remaining work continues.
    pub async fn bootstrap(&mut self) -> Result<BootstrapReport, EngineError> {
        let windows = self
            .host
            .windows()
            .await
            .map_err(EngineError::host("list windows"))?;

        self.store.clear();
        self.phases.clear();
        info!(windows = windows.len(), rules = self.rules.len(), "Bootstrap started");

        let mut report = BootstrapReport::default();
        for window in windows {
            self.bootstrap_window(window, &mut report).await;
            report.windows += 1;
        }

        info!(
            windows = report.windows,
            groups = report.groups,
            failures = report.failures.len(),
            "Bootstrap finished"
        );
        Ok(report)
    }

    async fn bootstrap_window(&mut self, window: WindowId, report: &mut BootstrapReport) {
        self.phases.insert(window, WindowPhase::Bootstrapping);
        self.store.seed_rules(window, &self.configuration.rules);

        match self.host.groups(window).await {
            Ok(groups) => {
                for group in &groups {
                    self.store.adopt_host_group(group);
                }
            }
            Err(err) => report
                .failures
                .push(EngineError::host("list groups")(err)),
        }

        match self.host.tabs(window).await {
            Ok(tabs) => {
                for tab in tabs {
                    let Some(url) = tab.url.as_deref() else {
                        continue;
                    };
                    // Deferred assignment never suspends on the host.
                    if let Err(err) = self.add_tab(window, tab.id, url, HostSync::Deferred).await {
                        report.failures.push(err);
                    }
                }
            }
            Err(err) => report.failures.push(EngineError::host("list tabs")(err)),
        }

        let titles: Vec<String> = self
            .store
            .sorted_groups(window)
            .into_iter()
            .filter(|group| !group.tab_ids.is_empty())
            .map(|group| group.title.clone())
            .collect();
        for title in titles {
            match self.materialize(window, &title).await {
                Ok(true) => report.groups += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(%window, %title, "Group not pushed to host: {err}");
                    report.failures.push(err);
                }
            }
        }

        self.phases.insert(window, WindowPhase::Ready);
        debug!(%window, groups = self.store.sorted_groups(window).len(), "Window ready");
    }

    /// Push one in-memory group to the host: group its tabs, set its display
    /// state, and move it to its computed position.
    ///
    /// Tabs the host no longer has (or that moved to another window) are
    /// dropped from the group first. Returns `false` when nothing was left
    /// to push.
    async fn materialize(&mut self, window: WindowId, title: &str) -> Result<bool, EngineError> {
        let Some(group) = self.store.group(window, title) else {
            return Ok(false);
        };
        let mut existing = group.host_id;
        let members: Vec<TabId> = group.tab_ids.iter().copied().collect();

        let lookups = join_all(members.iter().map(|tab| self.host.tab(*tab))).await;
        let mut pending = Vec::new();
        for (tab, lookup) in members.into_iter().zip(lookups) {
            match lookup {
                Ok(info) if info.window_id != window => {
                    debug!(%window, %tab, moved_to = %info.window_id, "Tab left the window");
                    self.store.remove_tab(window, tab);
                }
                Ok(info) => {
                    if existing.is_none() || info.group_id != existing {
                        pending.push(tab);
                    }
                }
                Err(err) if err.is_stale() => {
                    debug!(%window, %tab, "Tab closed during bootstrap");
                    self.store.remove_tab(window, tab);
                }
                Err(err) => return Err(EngineError::host("tab lookup")(err)),
            }
        }

        let populated = self
            .store
            .group(window, title)
            .is_some_and(|group| !group.tab_ids.is_empty());
        if !populated {
            return Ok(false);
        }

        // Extending an earlier group may have emptied this one's host group,
        // and the host drops empty groups.
        if let Some(id) = existing
            && !pending.is_empty()
            && !self.host_group_alive(window, id).await?
        {
            debug!(%window, %title, group = %id, "Bound host group is gone");
            if let Some(group) = self.store.group_mut(window, title) {
                group.host_id = None;
            }
            existing = None;
        }
        let host_id = match existing {
            Some(id) if pending.is_empty() => id,
            _ => self
                .host
                .create_or_extend_group(existing, &pending)
                .await
                .map_err(EngineError::host("create_or_extend_group"))?,
        };

        let Some(group) = self.store.group_mut(window, title) else {
            return Ok(false);
        };
        group.host_id = Some(host_id);
        let display = GroupDisplay {
            title: group.title.clone(),
            color: group.color,
            collapsed: None,
        };
        let rank = group.rank;

        self.host
            .update_group_display(host_id, &display)
            .await
            .map_err(EngineError::host("update_group_display"))?;
        let placement = self.store.placement_index(window, rank, title);
        self.host
            .move_group(host_id, placement.as_host_index())
            .await
            .map_err(EngineError::host("move_group"))?;
        debug!(%window, %title, group = %host_id, index = placement.as_host_index(), "Group pushed");
        Ok(true)
    }

    async fn host_group_alive(
        &self,
        window: WindowId,
        id: HostGroupId,
    ) -> Result<bool, EngineError> {
        let groups = self
            .host
            .groups(window)
            .await
            .map_err(EngineError::host("list groups"))?;
        Ok(groups.iter().any(|group| group.id == id))
    }
}
