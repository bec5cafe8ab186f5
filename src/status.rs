//! Per-source health, as last observed by the orchestrator.

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::debug;

use crate::events::{DashboardEvent, EventBus};
use crate::models::{SourceId, SourceStatus};

/// Holds the current status of every source and announces each transition.
///
/// Reads always see the latest write; nothing is buffered.
#[derive(Debug)]
pub struct StatusReporter {
    statuses: RefCell<BTreeMap<SourceId, SourceStatus>>,
    events: EventBus,
}

impl StatusReporter {
    /// Every known source starts out `pending`.
    pub fn new(events: EventBus) -> Self {
        let statuses = SourceId::ALL
            .into_iter()
            .map(|id| (id, SourceStatus::Pending))
            .collect();
        Self {
            statuses: RefCell::new(statuses),
            events,
        }
    }

    pub fn set_status(&self, source: SourceId, status: SourceStatus) {
        self.statuses.borrow_mut().insert(source, status);
        debug!(%source, %status, "source status changed");
        self.events
            .emit(DashboardEvent::StatusChanged { source, status });
    }

    pub fn set_all(&self, status: SourceStatus) {
        for source in SourceId::ALL {
            self.set_status(source, status);
        }
    }

    pub fn status(&self, source: SourceId) -> SourceStatus {
        self.statuses
            .borrow()
            .get(&source)
            .copied()
            .unwrap_or_default()
    }

    pub fn all(&self) -> BTreeMap<SourceId, SourceStatus> {
        self.statuses.borrow().clone()
    }
}
