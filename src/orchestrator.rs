//! Fan-out/fan-in fetch across every registered source.
//!
//! All adapters are started together and awaited together; one failing or
//! hanging source never cancels or blocks the others. Each call is bounded by
//! a timeout that turns a hang into a source failure. Results are merged per
//! item following the catalog's precedence list, and anything no source
//! delivered is filled from the item's synthetic baseline. The output is
//! always a complete snapshot or an error, never a partial one.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, ItemSpec};
use crate::config::{self, ApiConfig};
use crate::error::{Result, SourceError};
use crate::models::{ItemKey, PriceRecord, Snapshot, SourceId, SourceStatus};
use crate::sources::{SourceAdapter, SourceBatch, SyntheticGenerator};
use crate::status::StatusReporter;

/// Outcome of one adapter call after the fan-in.
type Settled = (SourceId, Option<SourceBatch>);

type Sections = (BTreeMap<ItemKey, PriceRecord>, BTreeMap<ItemKey, PriceRecord>);

pub struct FetchOrchestrator {
    sources: Vec<Box<dyn SourceAdapter>>,
    catalog: Catalog,
    synthetic: Rc<SyntheticGenerator>,
    source_timeout: Duration,
    testing_status_delay: Duration,
}

impl FetchOrchestrator {
    pub fn new(
        sources: Vec<Box<dyn SourceAdapter>>,
        catalog: Catalog,
        synthetic: Rc<SyntheticGenerator>,
    ) -> Self {
        Self {
            sources,
            catalog,
            synthetic,
            source_timeout: config::SOURCE_TIMEOUT,
            testing_status_delay: config::TESTING_STATUS_DELAY,
        }
    }

    /// Upper bound on a single adapter call.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Delay before statuses are finalised in testing mode.
    pub fn with_testing_status_delay(mut self, delay: Duration) -> Self {
        self.testing_status_delay = delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The first adapter registered for `id`.
    pub fn source(&self, id: SourceId) -> Option<&dyn SourceAdapter> {
        self.sources
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    /// Probe a single source, bounded by the same timeout as a fetch.
    pub async fn probe(&self, id: SourceId) -> std::result::Result<(), SourceError> {
        let adapter = self
            .source(id)
            .ok_or_else(|| SourceError::Unavailable(format!("no adapter registered for {id}")))?;
        match tokio::time::timeout(self.source_timeout, adapter.probe()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SourceError::Timeout(self.source_timeout)),
        }
    }

    /// Build a fresh snapshot stamped with `now`.
    ///
    /// Source failures are absorbed (status `error` plus synthetic fallback).
    /// An `Err` means the snapshot could not be assembled at all.
    pub async fn fetch(
        &self,
        api: &ApiConfig,
        status: &StatusReporter,
        now: DateTime<Utc>,
    ) -> Result<Snapshot> {
        status.set_all(SourceStatus::Loading);
        info!(testing_mode = api.testing_mode, "fetching price data");

        let today = now.date_naive();
        let (items, yearly_items) = if api.testing_mode {
            self.fetch_testing(api, status, today).await?
        } else {
            let settled = self.collect(status).await;
            self.merge(&settled, today).await?
        };

        Ok(Snapshot {
            timestamp: now,
            items,
            yearly_items,
        })
    }

    /// Testing mode: no real source is touched. Statuses are finalised after
    /// a fixed delay, independently of the data generation.
    async fn fetch_testing(
        &self,
        api: &ApiConfig,
        status: &StatusReporter,
        today: NaiveDate,
    ) -> Result<Sections> {
        debug!("using synthetic data instead of source calls");
        let outcome = if api.force_errors {
            SourceStatus::Error
        } else {
            SourceStatus::Success
        };
        let finalize = async {
            tokio::time::sleep(self.testing_status_delay).await;
            status.set_all(outcome);
        };
        let generate = self.synthesize(self.catalog.items().iter().collect(), today);

        let (generated, ()) = tokio::join!(generate, finalize);
        let mut sections = Sections::default();
        for (spec, record) in generated? {
            insert(&mut sections, spec, record);
        }
        Ok(sections)
    }

    /// Run every adapter concurrently and wait for all of them to settle.
    async fn collect(&self, status: &StatusReporter) -> Vec<Settled> {
        let timeout = self.source_timeout;
        let calls = self.sources.iter().map(|adapter| async move {
            let outcome = match tokio::time::timeout(timeout, adapter.fetch()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::Timeout(timeout)),
            };
            (adapter.id(), outcome)
        });
        let settled = join_all(calls).await;

        let mut out = Vec::with_capacity(settled.len());
        for (id, outcome) in settled {
            match outcome {
                Ok(batch) => {
                    debug!(source = %id, records = batch.len(), "source fetch succeeded");
                    status.set_status(id, SourceStatus::Success);
                    out.push((id, Some(batch)));
                }
                Err(e) => {
                    error!("{}", e.into_dashboard(id));
                    status.set_status(id, SourceStatus::Error);
                    out.push((id, None));
                }
            }
        }

        for id in SourceId::ALL {
            if !out.iter().any(|(seen, _)| *seen == id) {
                warn!(source = %id, "no adapter registered");
                status.set_status(id, SourceStatus::Error);
            }
        }
        out
    }

    /// Pick each item from the highest-priority source that delivered it and
    /// synthesize the rest.
    async fn merge(&self, settled: &[Settled], today: NaiveDate) -> Result<Sections> {
        let mut sections = Sections::default();
        let mut missing = Vec::new();

        for spec in self.catalog.items() {
            match resolve(spec, settled) {
                Some(record) => insert(&mut sections, spec, record.clone()),
                None => missing.push(spec),
            }
        }

        if !missing.is_empty() {
            debug!(count = missing.len(), "falling back to synthetic records");
        }
        for (spec, record) in self.synthesize(missing, today).await? {
            insert(&mut sections, spec, record);
        }
        Ok(sections)
    }

    async fn synthesize<'a>(
        &self,
        specs: Vec<&'a ItemSpec>,
        today: NaiveDate,
    ) -> Result<Vec<(&'a ItemSpec, PriceRecord)>> {
        let records = join_all(specs.iter().map(|spec| self.synthetic.for_item(spec, today))).await;
        specs
            .into_iter()
            .zip(records)
            .map(|(spec, record)| record.map(|r| (spec, r)))
            .collect()
    }
}

/// First usable record for `spec`, walking its precedence list in order.
fn resolve<'a>(spec: &ItemSpec, settled: &'a [Settled]) -> Option<&'a PriceRecord> {
    for source in &spec.precedence {
        let found = settled
            .iter()
            .filter(|(id, _)| id == source)
            .filter_map(|(_, batch)| batch.as_ref())
            .find_map(|batch| batch.get(spec.upstream));
        match found {
            Some(record) if record.current.is_finite() => return Some(record),
            Some(_) => warn!(
                item = spec.key,
                %source,
                "discarding non-finite value"
            ),
            None => {}
        }
    }
    None
}

fn insert(sections: &mut Sections, spec: &ItemSpec, record: PriceRecord) {
    let target = if spec.is_yearly() {
        &mut sections.1
    } else {
        &mut sections.0
    };
    target.insert(spec.key.to_string(), record);
}
