//! # Retention Worker
//!
//! Background task that deletes ledger rows older than the retention window.
//!
//! ## Sweep Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Retention Sweep                                    │
//! │                                                                         │
//! │  tick (first one fires immediately)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cutoff = now - window_months                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DELETE FROM transactions WHERE created_at < cutoff                    │
//! │       │        (items follow via ON DELETE CASCADE)                    │
//! │       ▼                                                                 │
//! │  wait for next tick ◄──── or shutdown signal → exit                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products are never swept. A failed sweep is logged and retried on the
//! next tick.

use chrono::Utc;
use kopi_core::RetentionPolicy;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;

/// Periodically purges transactions older than the retention window.
pub struct RetentionWorker {
    db: Database,
    policy: RetentionPolicy,
    sweep_interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running [`RetentionWorker`].
#[derive(Clone)]
pub struct RetentionHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl RetentionHandle {
    /// Signals the worker to stop after its current sweep.
    pub async fn shutdown(&self) -> DbResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| DbError::Internal("Retention worker already stopped".to_string()))
    }
}

impl RetentionWorker {
    /// Creates a worker and its shutdown handle.
    pub fn new(
        db: Database,
        policy: RetentionPolicy,
        sweep_interval: Duration,
    ) -> (Self, RetentionHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = RetentionWorker {
            db,
            policy,
            sweep_interval,
            shutdown_rx,
        };

        (worker, RetentionHandle { shutdown_tx })
    }

    /// Runs sweeps until shutdown is signalled.
    pub async fn run(mut self) {
        info!(
            window_months = self.policy.window_months(),
            interval_secs = self.sweep_interval.as_secs(),
            "Starting retention worker"
        );

        let mut ticker = interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(?e, "Retention sweep failed");
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Retention worker shutting down");
                    break;
                }
            }
        }

        info!("Retention worker stopped");
    }

    /// Runs a single sweep and returns the number of transactions deleted.
    pub async fn sweep(&self) -> DbResult<u64> {
        let cutoff = self.policy.cutoff(Utc::now());
        let deleted = self.db.ledger().purge_before(cutoff).await?;

        if deleted > 0 {
            info!(deleted, %cutoff, "Retention sweep removed old transactions");
        }

        Ok(deleted)
    }
}
