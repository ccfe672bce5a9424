//! Engine lifecycle and result types.

use tabsort_types::{GroupState, ReloadAck, WindowId};

use crate::EngineError;

/// Per-window lifecycle.
///
/// `Uninitialized -> Bootstrapping -> Ready`; a reload sends every window
/// back through `Bootstrapping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPhase {
    #[default]
    Uninitialized,
    Bootstrapping,
    Ready,
}

/// Whether an `add_tab` should touch the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSync {
    /// Membership in memory only (bootstrap step 3).
    Deferred,
    /// Create or extend the physical group right away.
    Immediate,
}

/// What a bootstrap pass did.
///
/// Failures are per operation; one failed group never stops the rest.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub windows: usize,
    /// Groups pushed to the host (created, extended, or re-placed).
    pub groups: usize,
    pub failures: Vec<EngineError>,
}

impl BootstrapReport {
    #[must_use]
    pub fn ack(&self) -> ReloadAck {
        ReloadAck {
            windows: self.windows,
            groups: self.groups,
            failures: self.failures.len(),
        }
    }
}

/// Result of dispatching one host notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// Nothing to do (no URL, unknown group, ungroupable URL).
    Ignored,
    Reloaded(ReloadAck),
}

/// Snapshot of one window's groups in strip order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLayout {
    pub window: WindowId,
    pub phase: WindowPhase,
    pub groups: Vec<GroupState>,
}
