//! Read-only views over the engine state.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use vigil_core::metrics::AggregatedMetrics;
use vigil_core::snapshot::HealthSnapshot;
use vigil_core::{
    AlertLevel, AlertSummary, CoreError, HealthAlert, Score, StatusCounts, Timestamp,
};

use crate::engine::HealthEngine;
use crate::registry::{EntryHealth, EntrySummary};

/// Unresolved alerts shown on the dashboard.
const DASHBOARD_ALERT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub overall_score: Score,
    pub entry_count: usize,
    pub entries: Vec<EntrySummary>,
    pub status_counts: StatusCounts,
    /// Newest unresolved alerts, newest first.
    pub recent_alerts: Vec<HealthAlert>,
    pub metrics: AggregatedMetrics,
    pub snapshot_count: usize,
    pub last_poll_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub overall_score: Score,
    pub status_counts: StatusCounts,
    pub metrics: AggregatedMetrics,
    pub alerts: AlertSummary,
    pub history_depth: usize,
    /// Share of recorded snapshots at or above the alert threshold.
    pub uptime_percent: f64,
}

impl HealthEngine {
    /// Platform score as of the last poll or single-entry check.
    pub async fn overall_score(&self) -> Score {
        self.platform.read().await.score
    }

    pub async fn dashboard(&self) -> Dashboard {
        let entries = self.registry.summaries().await;
        let status_counts = StatusCounts::tally(entries.iter().map(|e| e.status));
        let platform = *self.platform.read().await;
        let recent_alerts = self
            .alerts
            .lock()
            .await
            .recent_unresolved(DASHBOARD_ALERT_LIMIT);
        let metrics = self.metrics.read().await.clone();
        let snapshot_count = self.history.read().await.len();

        Dashboard {
            overall_score: platform.score,
            entry_count: entries.len(),
            entries,
            status_counts,
            recent_alerts,
            metrics,
            snapshot_count,
            last_poll_at: platform.last_poll_at,
        }
    }

    pub async fn entry_health(&self, name: &str) -> Result<EntryHealth, CoreError> {
        self.registry
            .health(name)
            .await
            .ok_or_else(|| CoreError::NotFound(name.to_string()))
    }

    /// Snapshots from the last `hours` hours, oldest first.
    ///
    /// A window reaching past the earliest representable time returns the
    /// whole history.
    pub async fn history(&self, hours: u32) -> Vec<HealthSnapshot> {
        let cutoff = TimeDelta::try_hours(i64::from(hours))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.history.read().await.since(cutoff)
    }

    /// All stored alerts, newest first, optionally restricted to one level.
    pub async fn alerts(&self, level: Option<AlertLevel>) -> Vec<HealthAlert> {
        self.alerts
            .lock()
            .await
            .iter()
            .rev()
            .filter(|a| level.map_or(true, |level| a.level == level))
            .cloned()
            .collect()
    }

    pub async fn performance_report(&self) -> PerformanceReport {
        let status_counts = self
            .registry
            .with_entries(|entries| StatusCounts::tally(entries.map(|e| e.status)))
            .await;
        let overall_score = self.overall_score().await;
        let metrics = self.metrics.read().await.clone();
        let alerts = self.alerts.lock().await.summary();
        let (history_depth, uptime_percent) = {
            let history = self.history.read().await;
            (
                history.len(),
                history.uptime_percent(self.config.alert_threshold),
            )
        };

        PerformanceReport {
            overall_score,
            status_counts,
            metrics,
            alerts,
            history_depth,
            uptime_percent,
        }
    }

    /// The `count` lowest-scoring entries, worst first.
    pub async fn top_issues(&self, count: usize) -> Vec<EntrySummary> {
        let mut issues = self.registry.summaries().await;
        issues.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.name.cmp(&b.name)));
        issues.truncate(count);
        issues
    }
}
