//! Age-aware persistence of the current price snapshot.
//!
//! Decides whether a new fetch is due, and reads/writes the latest snapshot
//! through the [`KeyValueStore`]. An expired or malformed cached snapshot is
//! a cache miss, never an error.

use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config;
use crate::error::Result;
use crate::models::Snapshot;
use crate::store::{self, KeyValueStore};

pub struct SnapshotCache {
    store: Rc<dyn KeyValueStore>,
    key: String,
    max_age: chrono::Duration,
    /// If false, snapshots are never read from or written to the store.
    pub enabled: bool,
}

impl SnapshotCache {
    pub fn new(store: Rc<dyn KeyValueStore>, max_age: Duration) -> Self {
        Self {
            store,
            key: config::SNAPSHOT_KEY.to_string(),
            max_age: chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX),
            enabled: true,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn max_age(&self) -> chrono::Duration {
        self.max_age
    }

    /// Whether a snapshot taken at `last` should be replaced at `now`.
    ///
    /// True when there is no snapshot, when the calendar date has changed,
    /// or when more than `max_age` has elapsed.
    pub fn needs_refresh(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(last) = last else {
            return true;
        };
        last.date_naive() != now.date_naive() || now - last > self.max_age
    }

    /// Cached snapshot, if one exists and is younger than `max_age` at `now`.
    pub fn load(&self, now: DateTime<Utc>) -> Option<Snapshot> {
        if !self.enabled {
            return None;
        }
        let snapshot = self.load_any()?;
        if now - snapshot.timestamp < self.max_age {
            info!(timestamp = %snapshot.timestamp, "using cached snapshot");
            Some(snapshot)
        } else {
            info!(timestamp = %snapshot.timestamp, "cached snapshot is too old");
            None
        }
    }

    /// Cached snapshot regardless of age, for serving when a refresh fails.
    pub fn load_any(&self) -> Option<Snapshot> {
        if !self.enabled {
            return None;
        }
        let snapshot = store::load_json(self.store.as_ref(), &self.key);
        if snapshot.is_none() {
            debug!(key = %self.key, "no cached snapshot");
        }
        snapshot
    }

    /// Persist `snapshot` as the current one, replacing whatever was there.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        store::save_json(self.store.as_ref(), &self.key, snapshot)?;
        debug!(timestamp = %snapshot.timestamp, "snapshot cached");
        Ok(())
    }
}
