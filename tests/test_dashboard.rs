//! Dashboard lifecycle tests: startup, update checks, failure recovery,
//! credentials and connection tests.

mod common;

use std::rc::Rc;

use amoxiq::catalog::{Catalog, ItemSpec};
use amoxiq::clock::{Clock, ManualClock};
use amoxiq::config;
use amoxiq::models::{SourceId, SourceStatus};
use amoxiq::store::{self, KeyValueStore};
use amoxiq::{ApiConfig, Dashboard, DashboardEvent, MemoryStore, Severity};
use chrono::Duration;
use common::{FailingSource, StaticSource};

const WELCOME: &str =
    "Welcome to AmoxIQ Consumer Price Dashboard! Data is updated daily from official sources.";

fn setup() -> (Rc<MemoryStore>, Rc<ManualClock>) {
    (
        Rc::new(MemoryStore::new()),
        Rc::new(ManualClock::new(common::fixed_now())),
    )
}

fn broken_catalog() -> Catalog {
    Catalog::new(vec![ItemSpec::price(
        "broken",
        "broken",
        &[SourceId::Bls],
        SourceId::Bls,
        f64::NAN,
        1.0,
    )])
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn start_without_cache_fetches_and_persists() {
    let (store, clock) = setup();
    let dashboard = common::builder(store.clone(), clock).build().unwrap();
    let mut rx = dashboard.subscribe();

    let from_cache = dashboard.start().await;

    assert!(!from_cache);
    let snap = dashboard.snapshot().unwrap();
    assert_eq!(snap.len(), 8);
    assert_eq!(dashboard.last_updated(), Some(common::fixed_now()));
    assert!(store.get(config::SNAPSHOT_KEY).is_some());
    assert_eq!(dashboard.history()["egg"].len(), 1);

    let events = common::drain(&mut rx);
    let messages = common::notifications(&events);
    assert_eq!(
        messages,
        vec![
            "Updating price data...".to_string(),
            "Price data updated successfully!".to_string(),
            WELCOME.to_string(),
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, DashboardEvent::SnapshotChanged(s) if *s == snap)));
}

#[tokio::test(start_paused = true)]
async fn start_serves_fresh_cache_without_fetching() {
    let (store, clock) = setup();
    let cached = common::snapshot(common::fixed_now() - Duration::hours(2), &[("egg", 3.00)]);
    store::save_json(store.as_ref(), config::SNAPSHOT_KEY, &cached).unwrap();
    store
        .set(config::HISTORY_KEY, r#"{"egg": {"2024-03-15": 3.0}}"#)
        .unwrap();

    let bls = StaticSource::new(SourceId::Bls, vec![]);
    let calls = bls.calls();
    let dashboard = common::builder(store, clock)
        .source(Box::new(bls))
        .build()
        .unwrap();
    let mut rx = dashboard.subscribe();

    assert!(dashboard.start().await);
    assert_eq!(calls.get(), 0);
    assert_eq!(dashboard.snapshot(), Some(cached.clone()));
    assert_eq!(dashboard.last_updated(), Some(cached.timestamp));
    assert_eq!(dashboard.history()["egg"].len(), 1);

    let events = common::drain(&mut rx);
    assert!(matches!(&events[0], DashboardEvent::SnapshotChanged(s) if *s == cached));
    assert_eq!(common::notifications(&events), vec![WELCOME.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn start_refetches_when_cache_is_expired() {
    let (store, clock) = setup();
    let cached = common::snapshot(common::fixed_now() - Duration::hours(30), &[("egg", 3.00)]);
    store::save_json(store.as_ref(), config::SNAPSHOT_KEY, &cached).unwrap();

    let dashboard = common::builder(store, clock).build().unwrap();
    assert!(!dashboard.start().await);
    assert_eq!(dashboard.snapshot().unwrap().timestamp, common::fixed_now());
}

#[tokio::test(start_paused = true)]
async fn start_in_testing_mode_reports_success() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock)
        .api_config(ApiConfig::default().testing(true))
        .build()
        .unwrap();

    dashboard.start().await;

    let snap = dashboard.snapshot().unwrap();
    assert_eq!(snap.items.len(), 7);
    assert_eq!(snap.yearly_items.len(), 1);
    assert!(dashboard
        .statuses()
        .values()
        .all(|s| *s == SourceStatus::Success));
}

// ---------------------------------------------------------------------------
// check_for_updates
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn check_skips_when_snapshot_is_fresh() {
    let (store, clock) = setup();
    let bls = StaticSource::new(SourceId::Bls, vec![]);
    let calls = bls.calls();
    let dashboard = common::builder(store, clock.clone())
        .source(Box::new(bls))
        .build()
        .unwrap();

    dashboard.start().await;
    assert_eq!(calls.get(), 1);

    clock.advance(Duration::hours(1));
    assert!(!dashboard.check_for_updates(false).await);
    assert_eq!(calls.get(), 1);

    assert!(dashboard.check_for_updates(true).await);
    assert_eq!(calls.get(), 2);
}

#[tokio::test(start_paused = true)]
async fn check_refreshes_after_date_change() {
    let (store, clock) = setup();
    let dashboard = common::builder(store.clone(), clock.clone()).build().unwrap();
    dashboard.start().await;

    clock.advance(Duration::hours(13));
    assert!(dashboard.check_for_updates(false).await);
    assert_eq!(dashboard.last_updated(), Some(clock.now()));

    // Two days recorded.
    assert_eq!(dashboard.history()["milk"].len(), 2);
}

#[tokio::test(start_paused = true)]
async fn trigger_refresh_forces_fetch() {
    let (store, clock) = setup();
    let bls = StaticSource::new(
        SourceId::Bls,
        vec![common::record("eggs", 4.10, 3.90, SourceId::Bls)],
    );
    let calls = bls.calls();
    let dashboard = common::builder(store, clock)
        .source(Box::new(bls))
        .build()
        .unwrap();
    dashboard.start().await;

    assert!(dashboard.trigger_refresh(true).await);
    assert_eq!(calls.get(), 2);
    assert_eq!(dashboard.snapshot().unwrap().items["egg"].current, 4.10);
}

#[tokio::test(start_paused = true)]
async fn one_failing_source_is_not_a_refresh_failure() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock)
        .source(Box::new(FailingSource::new(SourceId::Eia)))
        .build()
        .unwrap();
    let mut rx = dashboard.subscribe();

    assert!(dashboard.check_for_updates(true).await);
    assert_eq!(dashboard.status(SourceId::Eia), SourceStatus::Error);
    assert_eq!(dashboard.snapshot().unwrap().items["gas"].current, 3.45);

    let messages = common::notifications(&common::drain(&mut rx));
    assert!(messages.contains(&"Price data updated successfully!".to_string()));
}

// ---------------------------------------------------------------------------
// Failure recovery
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_refresh_serves_last_cached_snapshot() {
    let (store, clock) = setup();
    let cached = common::snapshot(common::fixed_now() - Duration::days(3), &[("egg", 3.00)]);
    store::save_json(store.as_ref(), config::SNAPSHOT_KEY, &cached).unwrap();

    let dashboard = common::builder(store, clock)
        .catalog(broken_catalog())
        .build()
        .unwrap();
    let mut rx = dashboard.subscribe();

    assert!(!dashboard.start().await);
    assert_eq!(dashboard.snapshot(), Some(cached));
    assert!(dashboard
        .statuses()
        .values()
        .all(|s| *s == SourceStatus::Error));

    let events = common::drain(&mut rx);
    for event in &events {
        if let DashboardEvent::Notification(n) = event {
            assert_eq!(n.duration, config::NOTIFICATION_DURATION);
        }
    }
    let errors: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, DashboardEvent::Notification(n) if n.severity == Severity::Error))
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(common::notifications(&events).contains(
        &"Error fetching price data. Using cached data if available.".to_string()
    ));
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_without_cache_leaves_no_snapshot() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock)
        .catalog(broken_catalog())
        .build()
        .unwrap();

    dashboard.start().await;
    assert_eq!(dashboard.snapshot(), None);
    assert_eq!(dashboard.refresh().await, None);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_current_snapshot() {
    let (store, clock) = setup();
    let good = common::builder(store.clone(), clock.clone()).build().unwrap();
    good.start().await;
    let served = good.snapshot().unwrap();

    // Same store, but every refresh now fails.
    let dashboard = common::builder(store, clock.clone())
        .catalog(broken_catalog())
        .build()
        .unwrap();
    assert!(dashboard.start().await);
    clock.advance(Duration::days(1));

    assert!(!dashboard.check_for_updates(false).await);
    assert_eq!(dashboard.snapshot(), Some(served.clone()));
    assert_eq!(dashboard.refresh().await, Some(served));
}

#[tokio::test(start_paused = true)]
async fn refresh_returns_without_adopting() {
    let (store, clock) = setup();
    let dashboard = common::builder(store.clone(), clock.clone()).build().unwrap();

    let snap = dashboard.refresh().await.unwrap();
    assert_eq!(snap.len(), 8);
    assert_eq!(dashboard.snapshot(), None);
    assert!(store.get(config::SNAPSHOT_KEY).is_some());
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn save_credentials_persists_and_reloads() {
    let (store, clock) = setup();
    let dashboard = common::builder(store.clone(), clock.clone()).build().unwrap();
    let mut rx = dashboard.subscribe();

    let cfg = ApiConfig::default()
        .with_key(SourceId::Eia, "eia-key")
        .testing(true);
    dashboard.save_credentials(cfg.clone()).unwrap();
    assert_eq!(dashboard.api_config(), cfg);
    assert_eq!(
        common::notifications(&common::drain(&mut rx)),
        vec!["API configuration saved successfully!".to_string()]
    );

    let reopened = common::builder(store, clock).build().unwrap();
    assert_eq!(reopened.api_config(), cfg);
}

#[tokio::test(start_paused = true)]
async fn malformed_config_loads_default() {
    let (store, clock) = setup();
    store.set(config::CONFIG_KEY, "not json").unwrap();

    let dashboard = common::builder(store, clock).build().unwrap();
    assert_eq!(dashboard.api_config(), ApiConfig::default());
}

#[tokio::test(start_paused = true)]
async fn connection_test_in_testing_mode_succeeds() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock)
        .api_config(ApiConfig::default().testing(true))
        .build()
        .unwrap();
    let mut rx = dashboard.subscribe();

    assert!(dashboard.test_connection(SourceId::Usda).await);
    assert_eq!(dashboard.status(SourceId::Usda), SourceStatus::Success);

    let events = common::drain(&mut rx);
    assert_eq!(
        common::notifications(&events),
        vec![
            "Testing USDA API connection...".to_string(),
            "USDA API connection successful!".to_string(),
        ]
    );
    assert!(events.contains(&DashboardEvent::StatusChanged {
        source: SourceId::Usda,
        status: SourceStatus::Loading,
    }));
}

#[tokio::test(start_paused = true)]
async fn connection_test_against_placeholder_fails() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock).build().unwrap();
    let mut rx = dashboard.subscribe();
    let started = tokio::time::Instant::now();

    assert!(!dashboard.test_connection(SourceId::Bls).await);
    assert!(started.elapsed() >= config::PROBE_DELAY);
    assert_eq!(dashboard.status(SourceId::Bls), SourceStatus::Error);
    assert_eq!(
        common::notifications(&common::drain(&mut rx)).last().unwrap(),
        "BLS API connection failed. Check your API key."
    );
}

#[tokio::test(start_paused = true)]
async fn connection_test_uses_registered_adapter() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock)
        .source(Box::new(StaticSource::new(SourceId::Eia, vec![])))
        .build()
        .unwrap();

    assert!(dashboard.test_connection(SourceId::Eia).await);
    assert_eq!(dashboard.status(SourceId::Eia), SourceStatus::Success);
}

// ---------------------------------------------------------------------------
// Storage options
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn disabled_cache_still_records_history() {
    let (store, clock) = setup();
    let dashboard = common::builder(store.clone(), clock)
        .cache_enabled(false)
        .build()
        .unwrap();

    dashboard.start().await;
    assert!(dashboard.snapshot().is_some());
    assert_eq!(store.get(config::SNAPSHOT_KEY), None);
    assert!(store.get(config::HISTORY_KEY).is_some());
}

#[tokio::test(start_paused = true)]
async fn file_backed_dashboard_writes_documents() {
    let tmp = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::builder()
        .data_dir(tmp.path())
        .clock(Rc::new(ManualClock::new(common::fixed_now())))
        .synthetic_latency(None)
        .build()
        .unwrap();

    dashboard.start().await;
    assert!(tmp.path().join("amoxiq_price_data.json").exists());
    assert!(tmp.path().join("amoxiq_history_data.json").exists());
}

#[test]
fn zero_history_window_is_rejected() {
    let (store, clock) = setup();
    assert!(common::builder(store, clock)
        .history_window(0)
        .build()
        .is_err());
}

#[tokio::test(start_paused = true)]
async fn display_summarises_state() {
    let (store, clock) = setup();
    let dashboard = common::builder(store, clock).build().unwrap();
    assert!(dashboard.to_string().contains("last_updated=never"));

    dashboard.start().await;
    let shown = dashboard.to_string();
    assert!(shown.contains("items=8"));
    assert!(shown.contains("BLS=success"));
    assert!(shown.contains("testing_mode=false"));
}
