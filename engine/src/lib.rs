//! Reconciliation engine for tabsort.
//!
//! Keeps the per-window [`GroupStateStore`] consistent with the live host
//! while notifications arrive, and pushes group mutations to the host.
//!
//! # Execution model
//!
//! One engine instance owns all state and handles one notification at a
//! time. The only suspension points are calls into [`TabHost`]; after each
//! one the engine re-reads the store instead of trusting values captured
//! before the call. Host calls are awaited once and never retried.
//!
//! ```text
//! HostEvent ─> handle() ─┬─ TabAdded ──────> add_tab(Immediate) ─> host create/display/move
//!                        ├─ TabRemoved ────> store.remove_tab
//!                        ├─ GroupRemoved ──> store.on_group_removed
//!                        ├─ GroupUpdated ──> store.on_group_updated
//!                        └─ ReloadRequested> reload() ─> bootstrap()
//! ```

mod bootstrap;
pub mod host;
pub mod simulated;
mod source;
mod state;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use host::{GroupDisplay, HostError, HostFut, TabHost};
pub use simulated::{HostCall, Inventory, SimulatedHost};
pub use source::ConfigSource;
pub use state::{BootstrapReport, EventOutcome, HostSync, WindowLayout, WindowPhase};

use tabsort_core::{GroupStateStore, GroupTarget, RuleSet, fallback_target, resolve, url_host};
use tabsort_types::{Configuration, HostEvent, ReloadAck, TabId, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{operation} failed: {source}")]
    Host {
        operation: &'static str,
        #[source]
        source: HostError,
    },
}

impl EngineError {
    fn host(operation: &'static str) -> impl FnOnce(HostError) -> Self {
        move |source| EngineError::Host { operation, source }
    }

    /// The failed call referenced a tab or group that no longer exists.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        match self {
            EngineError::Host { source, .. } => source.is_stale(),
        }
    }
}

pub struct ReconciliationEngine<H: TabHost> {
    host: Arc<H>,
    source: Box<dyn ConfigSource>,
    configuration: Configuration,
    rules: RuleSet,
    store: GroupStateStore,
    phases: HashMap<WindowId, WindowPhase>,
}

impl<H: TabHost> ReconciliationEngine<H> {
    /// Create an engine and load configuration. No window is bootstrapped yet.
    pub fn new(host: Arc<H>, source: impl ConfigSource + 'static) -> Self {
        let mut engine = Self {
            host,
            source: Box::new(source),
            configuration: Configuration::default(),
            rules: RuleSet::default(),
            store: GroupStateStore::new(),
            phases: HashMap::new(),
        };
        let configuration = engine.source.load();
        engine.apply_configuration(configuration);
        engine
    }

    fn apply_configuration(&mut self, configuration: Configuration) {
        self.rules = RuleSet::new(&configuration.rules);
        for (rule, err) in self.rules.malformed() {
            warn!(
                rule = rule.id(),
                pattern = rule.match_content(),
                "Rule pattern does not compile; URLs reaching it use domain grouping: {err}"
            );
        }
        self.configuration = configuration;
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    #[must_use]
    pub fn store(&self) -> &GroupStateStore {
        &self.store
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[must_use]
    pub fn phase(&self, window: WindowId) -> WindowPhase {
        self.phases.get(&window).copied().unwrap_or_default()
    }

    /// Every known window's groups in strip order.
    #[must_use]
    pub fn layout(&self) -> Vec<WindowLayout> {
        self.store
            .window_ids()
            .into_iter()
            .map(|window| WindowLayout {
                window,
                phase: self.phase(window),
                groups: self
                    .store
                    .sorted_groups(window)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Re-read configuration and rebuild all state from the live host.
    pub async fn reload(&mut self) -> Result<ReloadAck, EngineError> {
        let configuration = self.source.load();
        self.apply_configuration(configuration);
        let report = self.bootstrap().await?;
        Ok(report.ack())
    }

    /// Apply one host notification.
    pub async fn handle(&mut self, event: HostEvent) -> Result<EventOutcome, EngineError> {
        debug!(kind = event.kind(), "Host event");
        match event {
            HostEvent::TabAdded { tab_id, url } => {
                let Some(url) = url else {
                    return Ok(EventOutcome::Ignored);
                };
                let info = self
                    .host
                    .tab(tab_id)
                    .await
                    .map_err(EngineError::host("tab lookup"))?;
                self.ensure_window(info.window_id);
                let placed = self
                    .add_tab(info.window_id, tab_id, &url, HostSync::Immediate)
                    .await?;
                Ok(outcome(placed.is_some()))
            }
            HostEvent::TabRemoved { tab_id, window_id } => {
                Ok(outcome(!self.remove_tab(window_id, tab_id).is_empty()))
            }
            HostEvent::GroupRemoved { window_id, title } => {
                let applied = self.store.on_group_removed(window_id, &title);
                if applied {
                    debug!(window = %window_id, %title, "Host group removed; entry kept for reuse");
                }
                Ok(outcome(applied))
            }
            HostEvent::GroupUpdated {
                window_id,
                title,
                color,
                host_group_id,
                collapsed,
            } => Ok(outcome(self.store.on_group_updated(
                window_id,
                &title,
                color,
                host_group_id,
                collapsed,
            ))),
            HostEvent::ReloadRequested => Ok(EventOutcome::Reloaded(self.reload().await?)),
        }
    }

    /// Windows first seen after bootstrap start empty and ready.
    fn ensure_window(&mut self, window: WindowId) {
        let phase = self.phases.entry(window).or_default();
        if *phase == WindowPhase::Uninitialized {
            debug!(%window, "Window opened after bootstrap");
            *phase = WindowPhase::Ready;
            self.store.get_or_create_window(window);
        }
    }

    fn target_for(&self, url: &str) -> Option<GroupTarget> {
        let Configuration {
            settings, aliases, ..
        } = &self.configuration;
        match resolve(url, &self.rules, settings, aliases) {
            Ok(target) => target,
            Err(err) => {
                warn!(url, "Rule matching failed, using domain grouping: {err}");
                url_host(url)
                    .filter(|host| !host.is_empty())
                    .map(|host| fallback_target(&host, settings, aliases))
            }
        }
    }

    /// Place `tab` into the group its URL resolves to.
    ///
    /// Returns the group title, or `None` when the URL cannot be grouped.
    /// With [`HostSync::Immediate`] the physical group is created or extended;
    /// a group that just received its host id also gets its display state and
    /// position pushed.
    pub async fn add_tab(
        &mut self,
        window: WindowId,
        tab: TabId,
        url: &str,
        sync: HostSync,
    ) -> Result<Option<String>, EngineError> {
        let Some(target) = self.target_for(url) else {
            debug!(%window, %tab, url, "URL cannot be grouped");
            return Ok(None);
        };
        let existing = self.store.assign_tab(window, tab, &target).host_id;
        let title = target.title;
        debug!(%window, %tab, %title, rank = %target.rank, "Tab assigned");

        if sync == HostSync::Deferred {
            return Ok(Some(title));
        }

        let host_id = self
            .host
            .create_or_extend_group(existing, &[tab])
            .await
            .map_err(EngineError::host("create_or_extend_group"))?;

        let Some(group) = self.store.group_mut(window, &title) else {
            return Ok(Some(title));
        };
        if !group.tab_ids.contains(&tab) {
            debug!(%window, %tab, %title, "Tab left the group during the host call");
            return Ok(Some(title));
        }
        if group.host_id.is_some() {
            return Ok(Some(title));
        }
        group.host_id = Some(host_id);
        let display = GroupDisplay {
            title: group.title.clone(),
            color: group.color,
            collapsed: Some(group.collapsed),
        };
        let rank = group.rank;

        self.host
            .update_group_display(host_id, &display)
            .await
            .map_err(EngineError::host("update_group_display"))?;
        let placement = self.store.placement_index(window, rank, &title);
        self.host
            .move_group(host_id, placement.as_host_index())
            .await
            .map_err(EngineError::host("move_group"))?;
        info!(%window, %title, group = %host_id, index = placement.as_host_index(), "Group created");
        Ok(Some(title))
    }

    /// Drop `tab` from every group of `window`. Returns the titles it left.
    pub fn remove_tab(&mut self, window: WindowId, tab: TabId) -> Vec<String> {
        let left = self.store.remove_tab(window, tab);
        if !left.is_empty() {
            debug!(%window, %tab, groups = ?left, "Tab removed");
        }
        left
    }

    /// Bootstrap, then apply notifications from `events` until the channel closes.
    ///
    /// Notifications are handled strictly in arrival order. When a reload is
    /// queued, every notification queued before it is superseded by the
    /// rebuild, and consecutive reload requests share one rebuild. Each
    /// request still receives its own acknowledgement on `acks`.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<HostEvent>,
        acks: Option<mpsc::Sender<ReloadAck>>,
    ) -> Self {
        match self.bootstrap().await {
            Ok(report) => info!(
                windows = report.windows,
                groups = report.groups,
                failures = report.failures.len(),
                "Initial bootstrap complete"
            ),
            Err(err) => warn!("Initial bootstrap failed: {err}"),
        }

        let mut backlog: VecDeque<HostEvent> = VecDeque::new();
        loop {
            if backlog.is_empty() {
                match events.recv().await {
                    Some(event) => backlog.push_back(event),
                    None => break,
                }
            }
            while let Ok(event) = events.try_recv() {
                backlog.push_back(event);
            }

            let is_reload = |event: &HostEvent| matches!(event, HostEvent::ReloadRequested);
            if let Some(last) = backlog.iter().rposition(is_reload) {
                let requests = backlog.iter().take(last + 1).filter(|e| is_reload(e)).count();
                backlog.drain(..=last);
                debug!(
                    requests,
                    superseded = last + 1 - requests,
                    "Reload requested"
                );
                match self.reload().await {
                    Ok(ack) => {
                        info!(
                            windows = ack.windows,
                            groups = ack.groups,
                            failures = ack.failures,
                            "Reload complete"
                        );
                        if let Some(acks) = &acks {
                            for _ in 0..requests {
                                if acks.send(ack).await.is_err() {
                                    debug!("Reload acknowledgement receiver dropped");
                                    break;
                                }
                            }
                        }
                    }
                    Err(err) => warn!("Reload failed: {err}"),
                }
                continue;
            }

            if let Some(event) = backlog.pop_front() {
                let kind = event.kind();
                if let Err(err) = self.handle(event).await {
                    warn!(kind, stale = err.is_stale(), "Host event not applied: {err}");
                }
            }
        }
        self
    }
}

fn outcome(applied: bool) -> EventOutcome {
    if applied {
        EventOutcome::Applied
    } else {
        EventOutcome::Ignored
    }
}
