//! Main service loop: drives the reminder engine's due check.
//!
//! One interval ticks the engine; Ctrl-C stops the loop. A reminder that is
//! being spoken when the service stops is not advanced.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::reminder::ReminderEngine;

pub struct ReminderService {
    engine: Arc<ReminderEngine>,
    tick_interval: Duration,
}

impl ReminderService {
    pub fn new(engine: Arc<ReminderEngine>, config: &SchedulerConfig) -> Self {
        Self {
            engine,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Tick the engine until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = io::Result<()>>,
    {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            "Service ready, checking reminders every {}ms",
            self.tick_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // The fire transition runs on its own task
                    let _ = self.engine.tick(Utc::now());
                }
                signal = &mut shutdown => {
                    signal?;
                    info!("Shutting down ({} reminders pending)", self.engine.pending().len());
                    break;
                }
            }
        }

        Ok(())
    }
}
