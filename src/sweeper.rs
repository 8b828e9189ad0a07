// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Periodic removal of expired rate limit records.

use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to a running sweep task.
///
/// Dropping the handle aborts the task.
pub struct SweepHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Stop the sweep task and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            log_task_exit(task.await);
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Log an abnormal sweeper exit. Returns `false` when the task failed.
fn log_task_exit(result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.is_cancelled() => true,
        Err(e) => {
            warn!(error = %e, "Rate limit sweeper exited abnormally");
            false
        }
    }
}

/// Spawn a task that sweeps `limiter` every `period`.
///
/// The first sweep runs one full period after spawning.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    period: Duration,
    metrics: Option<Arc<Metrics>>,
) -> SweepHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Rate limit sweeper started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = limiter.sweep().await;
                    let tracked = limiter.len().await;
                    debug!(removed, tracked, "Swept expired rate limit records");

                    if let Some(metrics) = &metrics {
                        metrics.swept_records.inc_by(removed as u64);
                        metrics.tracked_identifiers.set(tracked as i64);
                    }
                }
                _ = &mut shutdown_rx => break,
            }
        }

        info!("Rate limit sweeper stopped");
    });

    SweepHandle {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}
