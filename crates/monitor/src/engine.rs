//! The health engine: owner of the registry, alert log, score history and
//! background schedules.
//!
//! [`HealthEngine`] is created once via [`HealthEngine::new`] and shared as
//! an `Arc`. Polling and snapshotting run as background tasks started with
//! [`HealthEngine::start`]; [`HealthEngine::destroy`] stops them and freezes
//! all state.
//!
//! Events are broadcast on an internal [`EventBus`]. Call
//! [`HealthEngine::subscribe`] to receive them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vigil_core::metrics::AggregatedMetrics;
use vigil_core::scoring::{overall_score, MAX_SCORE};
use vigil_core::snapshot::{HealthSnapshot, SnapshotHistory};
use vigil_core::thresholds::ThresholdMonitor;
use vigil_core::{AlertLevel, AlertLog, CoreError, HealthAlert, Score, Timestamp};
use vigil_events::{EventBus, HealthEvent};

use crate::background;
use crate::companions::Companions;
use crate::config::MonitorConfig;
use crate::probe::{HealthSource, ProbeHandle};
use crate::registry::Registry;

/// How long [`HealthEngine::destroy`] waits for each background task.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Platform-level results of the most recent poll.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlatformState {
    pub score: Score,
    pub last_poll_at: Option<Timestamp>,
}

/// Health-monitoring aggregation engine.
pub struct HealthEngine {
    pub(crate) config: MonitorConfig,
    pub(crate) registry: Registry,
    pub(crate) alerts: Mutex<AlertLog>,
    pub(crate) thresholds: Mutex<ThresholdMonitor>,
    pub(crate) history: RwLock<SnapshotHistory>,
    pub(crate) metrics: RwLock<AggregatedMetrics>,
    pub(crate) platform: RwLock<PlatformState>,
    pub(crate) companions: Companions,
    events: EventBus,
    /// Master cancellation token. Cancelled exactly once, by `destroy`.
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started_at: Timestamp,
}

impl HealthEngine {
    pub fn new(config: MonitorConfig, companions: Companions) -> Arc<Self> {
        Arc::new(Self {
            registry: Registry::new(),
            alerts: Mutex::new(AlertLog::new(config.max_alerts, config.alert_dedup_window)),
            thresholds: Mutex::new(ThresholdMonitor::new(
                config.alert_threshold,
                config.sustained_degradation,
            )),
            history: RwLock::new(SnapshotHistory::new(config.max_snapshots)),
            metrics: RwLock::new(AggregatedMetrics::default()),
            platform: RwLock::new(PlatformState {
                score: MAX_SCORE,
                last_poll_at: None,
            }),
            companions,
            events: EventBus::default(),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            started_at: Utc::now(),
            config,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<HealthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: HealthEvent) {
        self.events.publish(event);
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ---- registration ----

    /// Start monitoring a collaborator under `name`.
    pub async fn register(&self, name: &str, probe: ProbeHandle) -> Result<(), CoreError> {
        if self.is_destroyed() {
            return Err(CoreError::ShutDown);
        }
        let kind = probe.kind();
        self.registry.insert(name, probe, Utc::now()).await?;

        tracing::info!(entry = %name, probe = kind, "Registered health entry");
        self.add_alert(AlertLevel::Info, format!("Registered {name}"), name)
            .await;
        Ok(())
    }

    /// Stop monitoring `name`. Returns whether it was registered.
    pub async fn unregister(&self, name: &str) -> bool {
        if self.is_destroyed() || !self.registry.remove(name).await {
            return false;
        }

        tracing::info!(entry = %name, "Unregistered health entry");
        self.add_alert(AlertLevel::Info, format!("Unregistered {name}"), name)
            .await;
        true
    }

    /// Register every probe `source` advertises that is not already
    /// registered. Returns how many were added.
    pub async fn discover(&self, source: &dyn HealthSource) -> usize {
        let mut added = 0;
        for (name, probe) in source.health_probes() {
            match self.register(&name, probe).await {
                Ok(()) => added += 1,
                Err(CoreError::DuplicateName(_)) => {
                    tracing::debug!(entry = %name, "Discovery skipped already registered entry");
                }
                Err(CoreError::ShutDown) => break,
                Err(e) => {
                    tracing::warn!(entry = %name, error = %e, "Discovery skipped invalid entry");
                }
            }
        }
        added
    }

    pub async fn entry_count(&self) -> usize {
        self.registry.len().await
    }

    // ---- alerts ----

    /// Raise an alert unless an identical one is still fresh.
    ///
    /// Returns the stored alert, or `None` if it was deduplicated or the
    /// engine is destroyed.
    pub async fn add_alert(
        &self,
        level: AlertLevel,
        message: impl Into<String>,
        subject: impl Into<String>,
    ) -> Option<HealthAlert> {
        if self.is_destroyed() {
            return None;
        }
        let alert = self
            .alerts
            .lock()
            .await
            .raise(level, message, subject, Utc::now())?;

        match alert.level {
            AlertLevel::Critical => {
                tracing::error!(subject = %alert.subject, message = %alert.message, "Critical health alert")
            }
            AlertLevel::Warning => {
                tracing::warn!(subject = %alert.subject, message = %alert.message, "Health warning")
            }
            AlertLevel::Info => {
                tracing::info!(subject = %alert.subject, message = %alert.message, "Health notice")
            }
        }

        self.publish(HealthEvent::AlertRaised {
            alert: alert.clone(),
        });
        Some(alert)
    }

    /// Mark an alert resolved. Returns `false` if it is unknown or already
    /// resolved.
    pub async fn resolve_alert(&self, id: Uuid) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let resolved = self.alerts.lock().await.resolve(id, Utc::now());
        if resolved {
            tracing::info!(alert_id = %id, "Alert resolved");
        }
        resolved
    }

    // ---- scoring and snapshots ----

    /// Recompute the platform score from current entry scores.
    pub(crate) async fn refresh_platform_score(&self) -> Score {
        let score = self
            .registry
            .with_entries(|entries| overall_score(entries.map(|e| e.score)))
            .await;
        self.platform.write().await.score = score;
        score
    }

    /// Capture a snapshot of the current entry state into the history.
    pub async fn record_snapshot(&self) -> Option<HealthSnapshot> {
        if self.is_destroyed() {
            return None;
        }
        let snapshot = self
            .registry
            .with_entries(|entries| {
                HealthSnapshot::capture(
                    entries.map(|e| (e.name.as_str(), e.status, e.score)),
                    Utc::now(),
                )
            })
            .await;

        let mut history = self.history.write().await;
        history.record(snapshot.clone());
        tracing::debug!(
            overall_score = snapshot.overall_score,
            history_len = history.len(),
            "Recorded health snapshot",
        );
        Some(snapshot)
    }

    // ---- lifecycle ----

    /// Spawn the poll and snapshot loops.
    ///
    /// Calling `start` on a running or destroyed engine does nothing.
    pub async fn start(self: &Arc<Self>) {
        if self.is_destroyed() {
            tracing::warn!("Ignoring start of a destroyed health engine");
            return;
        }
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            tracing::warn!("Health engine already started");
            return;
        }

        tasks.push(tokio::spawn(background::run_poll_loop(
            Arc::downgrade(self),
            self.config.poll_interval,
            self.cancel.child_token(),
        )));
        tasks.push(tokio::spawn(background::run_snapshot_loop(
            Arc::downgrade(self),
            self.config.snapshot_interval,
            self.cancel.child_token(),
        )));

        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            snapshot_interval_secs = self.config.snapshot_interval.as_secs(),
            "Health engine started",
        );
    }

    /// Stop the background loops and freeze all state.
    ///
    /// Waits up to 5 seconds per task for a clean exit.
    pub async fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        tracing::info!("Shutting down health engine");
        self.cancel.cancel();

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await.is_err() {
                tracing::warn!("Background task did not stop in time");
            }
        }

        tracing::info!("Health engine shut down complete");
    }
}
