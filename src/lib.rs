//! AmoxIQ consumer price dashboard core.
//!
//! Fetches consumer prices (eggs, milk, gasoline, ...) from several
//! statistics providers in parallel, falls back to synthetic values per item
//! when a provider fails, caches the merged snapshot locally, and keeps a
//! rolling 365-day history per item. Rendering is left to whoever subscribes
//! to the [`events`].
//!
//! # Quick start
//!
//! ```no_run
//! use amoxiq::Dashboard;
//!
//! # async fn run() -> amoxiq::Result<()> {
//! let dashboard = Dashboard::builder().build()?;
//! let mut events = dashboard.subscribe();
//!
//! // Serve the cached snapshot or fetch a new one.
//! dashboard.start().await;
//! if let Some(snapshot) = dashboard.snapshot() {
//!     println!("{} items as of {}", snapshot.len(), snapshot.timestamp);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod sources;
pub mod status;
pub mod store;

pub use cache::SnapshotCache;
pub use catalog::{Catalog, ItemSpec};
pub use config::ApiConfig;
pub use error::{DashboardError, Result, SourceError};
pub use events::{DashboardEvent, Notification, Severity};
pub use history::HistoryTracker;
pub use orchestrator::FetchOrchestrator;
pub use scheduler::Scheduler;
pub use status::StatusReporter;
pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::events::EventBus;
use crate::models::{HistorySeries, Snapshot, SourceId, SourceStatus};
use crate::sources::{PlaceholderSource, SourceAdapter, SyntheticGenerator};

const WELCOME: &str =
    "Welcome to AmoxIQ Consumer Price Dashboard! Data is updated daily from official sources.";

// ---------------------------------------------------------------------------
// DashboardBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Dashboard`].
///
/// Use [`Dashboard::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](DashboardBuilder::build).
pub struct DashboardBuilder {
    data_dir: Option<PathBuf>,
    store: Option<Rc<dyn KeyValueStore>>,
    clock: Option<Rc<dyn Clock>>,
    sources: Option<Vec<Box<dyn SourceAdapter>>>,
    catalog: Catalog,
    api_config: Option<ApiConfig>,
    cache_enabled: bool,
    max_age: Duration,
    check_interval: Duration,
    startup_recheck_delay: Duration,
    source_timeout: Duration,
    testing_status_delay: Duration,
    probe_delay: Duration,
    synthetic_latency: Option<Range<Duration>>,
    seed: Option<u64>,
    history_window: usize,
}

impl Default for DashboardBuilder {
    fn default() -> Self {
        let latency = config::SYNTHETIC_LATENCY_MS;
        Self {
            data_dir: None,
            store: None,
            clock: None,
            sources: None,
            catalog: Catalog::default(),
            api_config: None,
            cache_enabled: true,
            max_age: config::MAX_AGE,
            check_interval: config::CHECK_INTERVAL,
            startup_recheck_delay: config::STARTUP_RECHECK_DELAY,
            source_timeout: config::SOURCE_TIMEOUT,
            testing_status_delay: config::TESTING_STATUS_DELAY,
            probe_delay: config::PROBE_DELAY,
            synthetic_latency: Some(
                Duration::from_millis(latency.start)..Duration::from_millis(latency.end),
            ),
            seed: None,
            history_window: config::HISTORY_WINDOW,
        }
    }
}

impl DashboardBuilder {
    /// Directory for the file-backed store.
    ///
    /// Ignored when a custom [`store`](Self::store) is supplied. Defaults to
    /// the platform data directory (e.g. `~/.local/share/amoxiq` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a custom key-value store instead of files on disk.
    pub fn store(mut self, store: Rc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Register a source adapter. Once any is registered, the default
    /// placeholders for the three providers are not installed.
    pub fn source(mut self, source: Box<dyn SourceAdapter>) -> Self {
        self.sources.get_or_insert_with(Vec::new).push(source);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Start with this config instead of the persisted one.
    pub fn api_config(mut self, config: ApiConfig) -> Self {
        self.api_config = Some(config);
        self
    }

    /// Enable or disable snapshot caching. Defaults to `true`.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Maximum age of a cached snapshot. Defaults to 24 hours.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Interval between periodic update checks. Defaults to 1 hour.
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Delay of the background re-check after starting from cache.
    pub fn startup_recheck_delay(mut self, delay: Duration) -> Self {
        self.startup_recheck_delay = delay;
        self
    }

    /// Upper bound on a single source call. Defaults to 30 seconds.
    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn testing_status_delay(mut self, delay: Duration) -> Self {
        self.testing_status_delay = delay;
        self
    }

    pub fn probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    /// Simulated latency range for synthetic records; `None` disables it.
    pub fn synthetic_latency(mut self, latency: Option<Range<Duration>>) -> Self {
        self.synthetic_latency = latency;
        self
    }

    /// Seed the synthetic history generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Build the dashboard and load its persisted API config.
    ///
    /// Nothing is fetched yet; call [`Dashboard::start`] for that.
    pub fn build(self) -> Result<Dashboard> {
        if self.history_window == 0 {
            return Err(DashboardError::InvalidArgument(
                "history window must be at least one day".into(),
            ));
        }
        if self.check_interval.is_zero() {
            return Err(DashboardError::InvalidArgument(
                "check interval must be non-zero".into(),
            ));
        }

        let store: Rc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => Rc::new(FileStore::new(self.data_dir)?),
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Rc::new(SystemClock) as Rc<dyn Clock>);

        let api = match self.api_config {
            Some(api) => api,
            None => {
                let loaded = store::load_json::<ApiConfig>(store.as_ref(), config::CONFIG_KEY);
                if loaded.is_some() {
                    info!("loaded API configuration");
                }
                loaded.unwrap_or_default()
            }
        };

        let sources = self.sources.unwrap_or_else(|| {
            PlaceholderSource::all(|id| api.key(id).map(str::to_string))
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn SourceAdapter>)
                .collect()
        });

        let generator = SyntheticGenerator::new(self.seed);
        let generator = match self.synthetic_latency {
            Some(range) => generator.with_latency(range),
            None => generator.without_latency(),
        };

        let orchestrator = FetchOrchestrator::new(sources, self.catalog, Rc::new(generator))
            .with_source_timeout(self.source_timeout)
            .with_testing_status_delay(self.testing_status_delay);

        let events = EventBus::new();
        Ok(Dashboard {
            status: StatusReporter::new(events.clone()),
            cache: SnapshotCache::new(store.clone(), self.max_age).enabled(self.cache_enabled),
            history: HistoryTracker::new(store.clone()).with_window(self.history_window),
            orchestrator,
            events,
            store,
            clock,
            api: RefCell::new(api),
            snapshot: RefCell::new(None),
            last_updated: Cell::new(None),
            check_interval: self.check_interval,
            startup_recheck_delay: self.startup_recheck_delay,
            probe_delay: self.probe_delay,
        })
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Owns all dashboard state: the current snapshot, source statuses, history
/// and API config.
///
/// Single-threaded by construction; every method takes `&self` and no
/// interior borrow is held across an `.await`, so overlapping refreshes on
/// one runtime are safe. The latest completed refresh wins.
pub struct Dashboard {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    events: EventBus,
    status: StatusReporter,
    cache: SnapshotCache,
    history: HistoryTracker,
    orchestrator: FetchOrchestrator,
    api: RefCell<ApiConfig>,
    snapshot: RefCell<Option<Snapshot>>,
    last_updated: Cell<Option<DateTime<Utc>>>,
    check_interval: Duration,
    startup_recheck_delay: Duration,
    probe_delay: Duration,
}

impl Dashboard {
    pub fn builder() -> DashboardBuilder {
        DashboardBuilder::default()
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Serve the cached snapshot if it is fresh enough, otherwise fetch.
    ///
    /// Returns `true` if the snapshot came from cache; callers then usually
    /// schedule a background re-check (see [`scheduler`](Self::scheduler)).
    pub async fn start(&self) -> bool {
        info!("initializing AmoxIQ Dashboard v{}", config::VERSION);

        let from_cache = self.load_cached();
        if !from_cache {
            self.check_for_updates(true).await;
        }

        self.events.notify(WELCOME, Severity::Info);
        info!("dashboard initialization complete");
        from_cache
    }

    /// A scheduler for periodic checks, with the startup re-check included
    /// when the dashboard started from cache.
    pub fn scheduler(&self, started_from_cache: bool) -> Scheduler {
        let scheduler = Scheduler::new(self.check_interval);
        if started_from_cache {
            scheduler.with_initial_check(self.startup_recheck_delay)
        } else {
            scheduler
        }
    }

    fn load_cached(&self) -> bool {
        let Some(snapshot) = self.cache.load(self.clock.now()) else {
            return false;
        };
        self.history.load();
        self.adopt(snapshot);
        true
    }

    fn adopt(&self, snapshot: Snapshot) {
        self.last_updated.set(Some(snapshot.timestamp));
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        self.events.emit(DashboardEvent::SnapshotChanged(snapshot));
    }

    // -- Refresh -----------------------------------------------------------

    /// Fetch new data if `force` is set or the current snapshot is stale.
    ///
    /// Returns `true` if a fresh snapshot was adopted. On failure the last
    /// cached snapshot keeps being served.
    pub async fn check_for_updates(&self, force: bool) -> bool {
        let now = self.clock.now();
        let last = self.last_updated.get();
        if !force && !self.cache.needs_refresh(last, now) {
            debug!(last_updated = ?last, "no update needed");
            return false;
        }

        info!("fetching new price data");
        self.events.notify("Updating price data...", Severity::Info);

        match self.try_refresh().await {
            Ok(snapshot) => {
                self.adopt(snapshot);
                self.events
                    .notify("Price data updated successfully!", Severity::Success);
                true
            }
            Err(e) => {
                if let Some(fallback) = self.recover(e) {
                    if self.snapshot.borrow().is_none() {
                        self.adopt(fallback);
                    }
                }
                false
            }
        }
    }

    /// Same as [`check_for_updates`](Self::check_for_updates); entry point
    /// for a user-initiated refresh.
    pub async fn trigger_refresh(&self, force: bool) -> bool {
        self.check_for_updates(force).await
    }

    /// Build, persist and record a new snapshot.
    ///
    /// If the snapshot cannot be assembled, every source is marked `error`,
    /// one error notification is emitted, and the last cached snapshot (if
    /// any) is returned instead. This method does not change the current
    /// snapshot; [`check_for_updates`](Self::check_for_updates) does.
    pub async fn refresh(&self) -> Option<Snapshot> {
        match self.try_refresh().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => self.recover(e),
        }
    }

    async fn try_refresh(&self) -> Result<Snapshot> {
        let api = self.api.borrow().clone();
        let now = self.clock.now();

        let snapshot = self
            .orchestrator
            .fetch(&api, &self.status, now)
            .await
            .map_err(|e| DashboardError::RefreshFailed(e.to_string()))?;

        if let Err(e) = self.cache.save(&snapshot) {
            warn!("failed to cache snapshot: {e}");
        }
        if let Err(e) = self.history.record(now.date_naive(), &snapshot) {
            warn!("failed to store history: {e}");
        }
        Ok(snapshot)
    }

    fn recover(&self, err: DashboardError) -> Option<Snapshot> {
        error!("{err}");
        self.status.set_all(SourceStatus::Error);
        self.events.notify(
            "Error fetching price data. Using cached data if available.",
            Severity::Error,
        );
        self.cache
            .load_any()
            .or_else(|| self.snapshot.borrow().clone())
    }

    // -- Settings ----------------------------------------------------------

    /// Persist new credentials and testing switches and start using them.
    pub fn save_credentials(&self, config: ApiConfig) -> Result<()> {
        store::save_json(self.store.as_ref(), config::CONFIG_KEY, &config)?;
        *self.api.borrow_mut() = config;
        self.events
            .notify("API configuration saved successfully!", Severity::Success);
        Ok(())
    }

    /// Check one source's connectivity and report the result as its status.
    ///
    /// In testing mode the check always succeeds.
    pub async fn test_connection(&self, source: SourceId) -> bool {
        self.events
            .notify(format!("Testing {source} API connection..."), Severity::Info);
        self.status.set_status(source, SourceStatus::Loading);

        tokio::time::sleep(self.probe_delay).await;

        let testing = self.api.borrow().testing_mode;
        let outcome = if testing {
            Ok(())
        } else {
            self.orchestrator.probe(source).await
        };

        match outcome {
            Ok(()) => {
                self.status.set_status(source, SourceStatus::Success);
                self.events.notify(
                    format!("{source} API connection successful!"),
                    Severity::Success,
                );
                true
            }
            Err(e) => {
                warn!("{}", e.into_dashboard(source));
                self.status.set_status(source, SourceStatus::Error);
                self.events.notify(
                    format!("{source} API connection failed. Check your API key."),
                    Severity::Error,
                );
                false
            }
        }
    }

    // -- Queries -----------------------------------------------------------

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated.get()
    }

    pub fn history(&self) -> HistorySeries {
        self.history.series()
    }

    pub fn status(&self, source: SourceId) -> SourceStatus {
        self.status.status(source)
    }

    pub fn statuses(&self) -> BTreeMap<SourceId, SourceStatus> {
        self.status.all()
    }

    pub fn api_config(&self) -> ApiConfig {
        self.api.borrow().clone()
    }

    pub fn catalog(&self) -> &Catalog {
        self.orchestrator.catalog()
    }

    /// Receive snapshot, status and notification events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statuses: Vec<String> = self
            .statuses()
            .iter()
            .map(|(source, status)| format!("{source}={status}"))
            .collect();
        write!(
            f,
            "Dashboard(last_updated={}, items={}, sources=[{}], testing_mode={})",
            self.last_updated
                .get()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
            self.snapshot.borrow().as_ref().map_or(0, Snapshot::len),
            statuses.join(", "),
            self.api.borrow().testing_mode
        )
    }
}
