//! Periodic expiry sweep
//!
//! The engine owns no timers; this task asks it to evaluate expiry for
//! every open process on a fixed interval.

use crate::config::SweeperConfig;
use chrono::Utc;
use signing_engine::SigningEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Background task expiring overdue processes
pub struct ExpirySweeper {
    engine: Arc<SigningEngine>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(engine: Arc<SigningEngine>, config: &SweeperConfig) -> Self {
        Self {
            engine,
            interval: config.interval(),
        }
    }

    /// Sweep until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }

    /// One pass. Returns how many processes expired.
    pub async fn sweep_once(&self) -> usize {
        match self.engine.sweep_expired(Utc::now()).await {
            Ok(expired) => {
                if !expired.is_empty() {
                    tracing::info!(count = expired.len(), "Expired overdue processes");
                }
                expired.len()
            }
            Err(e) => {
                tracing::error!(error = %e, "Expiry sweep failed");
                0
            }
        }
    }
}
