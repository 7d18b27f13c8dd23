//! # Retry Worker
//!
//! Optional background task that keeps retrying PENDING submissions.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  every poll_interval:                                                  │
//! │     report = reconciler.retry_pending()                                │
//! │                                                                         │
//! │     ├── some synced / nothing to do ──► backoff.reset()                │
//! │     └── every attempt failed ─────────► sleep(backoff.next_backoff())  │
//! │                                          1s, 2s, 4s ... max_backoff     │
//! │                                                                         │
//! │  shutdown signal ──► stop (also interrupts a backoff sleep)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::RetrySettings;
use crate::error::{SyncError, SyncResult};
use crate::reconciler::PendingReconciler;

/// Timing for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
        }
    }
}

/// Retries pending submissions on an interval.
pub struct RetryWorker {
    reconciler: PendingReconciler,
    policy: RetryPolicy,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running [`RetryWorker`].
#[derive(Clone)]
pub struct RetryWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl RetryWorkerHandle {
    /// Asks the worker to stop after the current attempt.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Retry worker already stopped".into()))
    }
}

impl RetryWorker {
    /// Creates the worker and its handle.
    pub fn new(reconciler: PendingReconciler, policy: RetryPolicy) -> (Self, RetryWorkerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = RetryWorker {
            reconciler,
            policy,
            shutdown_rx,
        };

        (worker, RetryWorkerHandle { shutdown_tx })
    }

    /// Runs until shut down. Spawn it as a background task.
    pub async fn run(mut self) {
        info!(
            poll_interval = ?self.policy.poll_interval,
            "Retry worker starting"
        );

        let mut backoff = self.create_backoff();
        let mut interval = tokio::time::interval(self.policy.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let all_failed = match self.reconciler.retry_pending().await {
                        Ok(report) => report.all_failed(),
                        Err(e) => {
                            error!(error = %e, "Failed to read pending submissions");
                            true
                        }
                    };

                    if !all_failed {
                        backoff.reset();
                        continue;
                    }

                    if let Some(duration) = backoff.next_backoff() {
                        debug!(?duration, "Backing off before next retry cycle");

                        tokio::select! {
                            _ = tokio::time::sleep(duration) => {}
                            _ = self.shutdown_rx.recv() => {
                                info!("Shutdown during backoff");
                                break;
                            }
                        }
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Retry worker shutting down");
                    break;
                }
            }
        }

        info!("Retry worker stopped");
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.policy.initial_backoff,
            max_interval: self.policy.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
