//! Outbound events for whatever renders the dashboard.
//!
//! Subscribers receive every snapshot change, every status transition and
//! every user-facing notification through a broadcast channel. Emitting with
//! no subscriber attached is not an error.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::config;
use crate::models::{Snapshot, SourceId, SourceStatus};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// How long a renderer should keep the message on screen.
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    SnapshotChanged(Snapshot),
    StatusChanged {
        source: SourceId,
        status: SourceStatus,
    },
    Notification(Notification),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: DashboardEvent) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    /// Emit a notification with the default display duration.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.emit(DashboardEvent::Notification(Notification {
            message: message.into(),
            severity,
            duration: config::NOTIFICATION_DURATION,
        }));
    }
}
