//! Periodic poll and snapshot loops.
//!
//! Both loops hold only a [`Weak`] reference to the engine and exit when
//! `cancel` is triggered or the engine has been dropped.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::engine::HealthEngine;

/// Poll every entry on a fixed interval, starting immediately.
pub(crate) async fn run_poll_loop(
    engine: Weak<HealthEngine>,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Health poll loop started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Health poll loop stopping");
                break;
            }
            _ = interval.tick() => {
                let Some(engine) = engine.upgrade() else { break };
                if let Err(e) = engine.poll_all().await {
                    tracing::debug!(error = %e, "Health poll skipped");
                }
            }
        }
    }
}

/// Record a history snapshot on a fixed interval, one period after start.
pub(crate) async fn run_snapshot_loop(
    engine: Weak<HealthEngine>,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Health snapshot loop started");

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Health snapshot loop stopping");
                break;
            }
            _ = interval.tick() => {
                let Some(engine) = engine.upgrade() else { break };
                engine.record_snapshot().await;
            }
        }
    }
}
