//! Headless AmoxIQ runner.
//!
//! Starts the dashboard against the on-disk store and prints the current
//! snapshot as JSON. With `--watch`, keeps checking for updates on the
//! periodic schedule and logs every event until Ctrl-C.

use std::process::ExitCode;

use amoxiq::{Dashboard, DashboardEvent, Severity};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let watch = std::env::args().skip(1).any(|arg| arg == "--watch");

    let dashboard = match Dashboard::builder().build() {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("failed to initialise dashboard: {e}");
            return ExitCode::FAILURE;
        }
    };

    let from_cache = dashboard.start().await;

    match dashboard.snapshot() {
        Some(snapshot) => match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("failed to serialise snapshot: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            warn!("no price data available");
            if !watch {
                return ExitCode::FAILURE;
            }
        }
    }

    if !watch {
        return ExitCode::SUCCESS;
    }

    let scheduler = dashboard.scheduler(from_cache);
    let token = scheduler.cancellation_token();
    let mut events = dashboard.subscribe();

    let log_events = async {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(n)) => warn!("skipped {n} events"),
                    Err(RecvError::Closed) => break,
                },
            }
        }
    };

    tokio::join!(
        scheduler.run(&dashboard),
        scheduler.stop_on(tokio::signal::ctrl_c()),
        log_events
    );
    ExitCode::SUCCESS
}

fn log_event(event: &DashboardEvent) {
    match event {
        DashboardEvent::SnapshotChanged(snapshot) => {
            info!(
                timestamp = %snapshot.timestamp,
                items = snapshot.len(),
                "snapshot changed"
            );
        }
        DashboardEvent::StatusChanged { source, status } => {
            info!(%source, %status, "source status");
        }
        DashboardEvent::Notification(note) => match note.severity {
            Severity::Error => warn!("{}", note.message),
            Severity::Info | Severity::Success => info!("{}", note.message),
        },
    }
}
