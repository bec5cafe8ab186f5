//! Synthetic price generation.
//!
//! Stands in for a real provider in testing mode and fills any item no real
//! provider delivered. Change figures are derived deterministically from the
//! baseline; only the trailing history is randomized.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::catalog::{Baseline, Catalog, ItemSpec};
use crate::clock::Clock;
use crate::config;
use crate::error::{DashboardError, Result, SourceError};
use crate::models::{HistoryPoint, PriceRecord, SourceId};
use crate::sources::{SourceAdapter, SourceBatch};

/// Fabricates price records around a baseline.
pub struct SyntheticGenerator {
    rng: RefCell<StdRng>,
    latency: Option<Range<u64>>,
    months: u32,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SyntheticGenerator {
    /// Create a generator. A fixed `seed` makes the fabricated history repeatable.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: RefCell::new(rng),
            latency: Some(config::SYNTHETIC_LATENCY_MS),
            months: config::SYNTHETIC_HISTORY_MONTHS,
        }
    }

    /// Simulated latency per record, drawn uniformly from `range`.
    pub fn with_latency(mut self, range: Range<Duration>) -> Self {
        let start = range.start.as_millis() as u64;
        let end = range.end.as_millis() as u64;
        self.latency = (end > start).then_some(start..end);
        self
    }

    pub fn without_latency(mut self) -> Self {
        self.latency = None;
        self
    }

    async fn simulate_latency(&self) {
        let Some(range) = self.latency.clone() else {
            return;
        };
        let ms = self.rng.borrow_mut().gen_range(range);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Build a price record from a `current`/`previous` pair.
    pub async fn price(
        &self,
        name: &str,
        current: f64,
        previous: f64,
        source: SourceId,
        today: NaiveDate,
    ) -> Result<PriceRecord> {
        if !(current.is_finite() && previous.is_finite()) {
            return Err(DashboardError::InvalidArgument(format!(
                "non-finite baseline for '{name}': {current} / {previous}"
            )));
        }
        self.simulate_latency().await;
        let history = self.history(current, today);
        Ok(PriceRecord::new(name, current, previous, source, history))
    }

    /// Build a yearly-increase record.
    pub async fn yearly(
        &self,
        name: &str,
        yearly_percent: f64,
        source: SourceId,
        today: NaiveDate,
    ) -> Result<PriceRecord> {
        if !yearly_percent.is_finite() {
            return Err(DashboardError::InvalidArgument(format!(
                "non-finite yearly baseline for '{name}': {yearly_percent}"
            )));
        }
        self.simulate_latency().await;
        let history = self.history(yearly_percent, today);
        Ok(PriceRecord::yearly(name, yearly_percent, source, history))
    }

    /// Synthetic record for a catalog item from its hardcoded baseline.
    pub async fn for_item(&self, spec: &ItemSpec, today: NaiveDate) -> Result<PriceRecord> {
        match spec.baseline {
            Baseline::Price { current, previous } => {
                self.price(spec.upstream, current, previous, spec.origin, today)
                    .await
            }
            Baseline::Yearly { percent } => {
                self.yearly(spec.upstream, percent, spec.origin, today).await
            }
        }
    }

    /// Monthly points ending today, each within ±5% of `base`.
    pub fn history(&self, base: f64, today: NaiveDate) -> Vec<HistoryPoint> {
        let mut rng = self.rng.borrow_mut();
        (0..self.months)
            .rev()
            .map(|back| {
                let date = today
                    .checked_sub_months(Months::new(back))
                    .unwrap_or(today);
                let jitter: f64 = rng.gen::<f64>() - 0.5;
                HistoryPoint {
                    date,
                    value: base + jitter * (base * 0.1),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SyntheticSource
// ---------------------------------------------------------------------------

/// A mock provider that answers with synthetic records for every catalog
/// item it is listed as a source for.
pub struct SyntheticSource {
    id: SourceId,
    items: Vec<ItemSpec>,
    generator: Rc<SyntheticGenerator>,
    clock: Rc<dyn Clock>,
}

impl SyntheticSource {
    pub fn new(
        id: SourceId,
        catalog: &Catalog,
        generator: Rc<SyntheticGenerator>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let items = catalog
            .items()
            .iter()
            .filter(|spec| spec.precedence.contains(&id))
            .cloned()
            .collect();
        Self {
            id,
            items,
            generator,
            clock,
        }
    }
}

#[async_trait(?Send)]
impl SourceAdapter for SyntheticSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self) -> std::result::Result<SourceBatch, SourceError> {
        let today = self.clock.now().date_naive();
        let mut batch = SourceBatch::new();
        for spec in &self.items {
            let record = self
                .generator
                .for_item(spec, today)
                .await
                .map_err(|e| SourceError::Malformed(e.to_string()))?;
            // Credit the record to this provider rather than the fallback origin.
            let record = PriceRecord {
                source: self.id,
                ..record
            };
            batch.insert(spec.upstream.to_string(), record);
        }
        Ok(batch)
    }
}
