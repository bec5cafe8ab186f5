//! Shared test fixtures for the AmoxIQ integration tests.
//!
//! Provides a fixed test clock, scripted source adapters (`StaticSource`,
//! `FailingSource`, `HangingSource`) and a `Dashboard` builder preset that
//! keeps everything in memory with no synthetic latency.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use amoxiq::clock::ManualClock;
use amoxiq::error::SourceError;
use amoxiq::models::{PriceRecord, Snapshot, SourceId};
use amoxiq::sources::{SourceAdapter, SourceBatch};
use amoxiq::{Dashboard, DashboardBuilder, DashboardEvent, MemoryStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::broadcast::Receiver;

/// 2024-03-15T12:00:00Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub fn record(name: &str, current: f64, previous: f64, source: SourceId) -> PriceRecord {
    PriceRecord::new(name, current, previous, source, vec![])
}

/// A snapshot of regular items whose current and previous values are equal.
pub fn snapshot(at: DateTime<Utc>, values: &[(&str, f64)]) -> Snapshot {
    Snapshot {
        timestamp: at,
        items: values
            .iter()
            .map(|(key, v)| (key.to_string(), record(key, *v, *v, SourceId::Bls)))
            .collect(),
        yearly_items: Default::default(),
    }
}

/// In-memory dashboard on a manual clock, seeded and without latency.
pub fn builder(store: Rc<MemoryStore>, clock: Rc<ManualClock>) -> DashboardBuilder {
    Dashboard::builder()
        .store(store)
        .clock(clock)
        .seed(7)
        .synthetic_latency(None)
}

/// Everything currently buffered on `rx`.
pub fn drain(rx: &mut Receiver<DashboardEvent>) -> Vec<DashboardEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

pub fn notifications(events: &[DashboardEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            DashboardEvent::Notification(n) => Some(n.message.clone()),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scripted adapters
// ---------------------------------------------------------------------------

/// Answers every fetch with the same batch and counts calls.
pub struct StaticSource {
    id: SourceId,
    batch: SourceBatch,
    calls: Rc<Cell<usize>>,
}

impl StaticSource {
    pub fn new(id: SourceId, records: Vec<PriceRecord>) -> Self {
        let batch = records.into_iter().map(|r| (r.name.clone(), r)).collect();
        Self {
            id,
            batch,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Shared call counter, still readable after the adapter is boxed.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

#[async_trait(?Send)]
impl SourceAdapter for StaticSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.batch.clone())
    }
}

/// Always fails.
pub struct FailingSource {
    id: SourceId,
}

impl FailingSource {
    pub fn new(id: SourceId) -> Self {
        Self { id }
    }
}

#[async_trait(?Send)]
impl SourceAdapter for FailingSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        Err(SourceError::Unavailable(format!("{} is down", self.id)))
    }
}

/// Never answers.
pub struct HangingSource {
    id: SourceId,
}

impl HangingSource {
    pub fn new(id: SourceId) -> Self {
        Self { id }
    }
}

#[async_trait(?Send)]
impl SourceAdapter for HangingSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self) -> Result<SourceBatch, SourceError> {
        std::future::pending().await
    }
}
