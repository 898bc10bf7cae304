//! `vigil-monitor`: standalone health-monitoring daemon.
//!
//! Starts a [`HealthEngine`], logs every event it publishes, and shuts
//! down cleanly on SIGINT or SIGTERM.
//!
//! Configuration is read from `VIGIL_*` environment variables (see
//! [`MonitorConfig::from_env`]), optionally loaded from a `.env` file.

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil_events::HealthEvent;
use vigil_monitor::{Companions, HealthEngine, MonitorConfig, ProbeHandle};

/// Name the daemon registers itself under.
const SELF_ENTRY: &str = "vigil-monitor";

/// Log filter used when `RUST_LOG` is unset. Covers every Vigil crate.
const DEFAULT_LOG_FILTER: &str = "vigil_monitor=info,vigil_core=info,vigil_events=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env()?;
    tracing::info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        check_timeout_ms = config.check_timeout.as_millis() as u64,
        alert_threshold = config.alert_threshold,
        "Starting vigil-monitor",
    );

    let engine = HealthEngine::new(config, Companions::default());

    let mut events = engine.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    engine.register(SELF_ENTRY, ProbeHandle::Passive).await?;
    engine.start().await;

    shutdown_signal().await?;

    engine.destroy().await;
    logger.abort();
    tracing::info!("vigil-monitor stopped");
    Ok(())
}

fn log_event(event: &HealthEvent) {
    match event {
        HealthEvent::PollCompleted {
            score, entry_count, ..
        } => {
            tracing::debug!(event = event.event_type(), score, entry_count, "Event");
        }
        HealthEvent::AlertRaised { alert } => {
            tracing::debug!(
                event = event.event_type(),
                level = %alert.level,
                subject = %alert.subject,
                "Event",
            );
        }
        HealthEvent::EntryDegraded { name, status } => {
            tracing::info!(event = event.event_type(), entry = %name, status = %status, "Event");
        }
        HealthEvent::EntryRecovered {
            name,
            previous_status,
        } => {
            tracing::info!(
                event = event.event_type(),
                entry = %name,
                previous_status = %previous_status,
                "Event",
            );
        }
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received SIGINT (Ctrl-C), shutting down");
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl-C, shutting down");
    }

    Ok(())
}
