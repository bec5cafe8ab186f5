//! Periodic update checks with explicit cancellation.
//!
//! Runs on tokio's timer, so tests can drive it with paused virtual time.
//! Cancelling stops future ticks; a check already in progress is allowed to
//! finish.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Dashboard;

pub struct Scheduler {
    period: Duration,
    initial_check: Option<Duration>,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Check for updates every `period`, starting one period from now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            initial_check: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Run one extra check `delay` after starting.
    pub fn with_initial_check(mut self, delay: Duration) -> Self {
        self.initial_check = Some(delay);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel once `signal` resolves.
    ///
    /// A signal that fails to install also cancels, so the caller is never
    /// left with a loop nothing can stop.
    pub async fn stop_on<F>(&self, signal: F)
    where
        F: Future<Output = io::Result<()>>,
    {
        match signal.await {
            Ok(()) => info!("shutting down"),
            Err(e) => warn!("cannot listen for shutdown signal, stopping now: {e}"),
        }
        self.cancel.cancel();
    }

    /// Drive `dashboard` until cancelled.
    pub async fn run(&self, dashboard: &Dashboard) {
        info!(period = ?self.period, "scheduler started");

        if let Some(delay) = self.initial_check {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {
                    debug!("running initial background check");
                    dashboard.check_for_updates(false).await;
                }
            }
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    dashboard.check_for_updates(false).await;
                }
            }
        }
        info!("scheduler stopped");
    }
}
