//! Rolling per-item daily history used for trend charts.
//!
//! Each refresh upserts today's value for every item, then trims each item's
//! series to the newest `window` dates. Recording twice on the same date
//! overwrites that date's value. The series is only ever mutated in place,
//! never replaced by a snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::debug;

use crate::config;
use crate::error::Result;
use crate::models::{HistorySeries, Snapshot};
use crate::store::{self, KeyValueStore};

pub struct HistoryTracker {
    store: Rc<dyn KeyValueStore>,
    key: String,
    window: usize,
    series: RefCell<HistorySeries>,
}

impl HistoryTracker {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: config::HISTORY_KEY.to_string(),
            window: config::HISTORY_WINDOW,
            series: RefCell::new(HistorySeries::new()),
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Replace the in-memory series with the persisted one.
    ///
    /// A missing or malformed blob leaves an empty series.
    pub fn load(&self) -> HistorySeries {
        let series: HistorySeries =
            store::load_json(self.store.as_ref(), &self.key).unwrap_or_default();
        debug!(items = series.len(), "loaded history");
        *self.series.borrow_mut() = series.clone();
        series
    }

    /// Current in-memory series.
    pub fn series(&self) -> HistorySeries {
        self.series.borrow().clone()
    }

    /// Upsert `today`'s value for every record in `snapshot`, trim each item
    /// to the window, and write the whole series back.
    pub fn record(&self, today: NaiveDate, snapshot: &Snapshot) -> Result<HistorySeries> {
        // Merge into the persisted series, not the in-memory copy.
        let mut series: HistorySeries =
            store::load_json(self.store.as_ref(), &self.key).unwrap_or_default();

        for (key, record) in snapshot.all_records() {
            series
                .entry(key.clone())
                .or_default()
                .insert(today, record.current);
        }

        for dates in series.values_mut() {
            while dates.len() > self.window {
                dates.pop_first();
            }
        }

        store::save_json(self.store.as_ref(), &self.key, &series)?;
        *self.series.borrow_mut() = series.clone();
        Ok(series)
    }
}
