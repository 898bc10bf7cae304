//! Running health checks and recording their outcome.
//!
//! Every check follows the same path: take a [`CheckTarget`] copy, run the
//! probe bounded by the configured timeout, evaluate the result into a
//! status and score, then write it back and report any status transition.

use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::time::Instant;
use vigil_core::degradation::Transition;
use vigil_core::scoring::score_for;
use vigil_core::{resolve_status, AlertLevel, CoreError, HealthStatus, Score, Timestamp};
use vigil_events::HealthEvent;

use crate::engine::HealthEngine;
use crate::probe::ProbeError;
use crate::registry::{AppliedCheck, CheckResult, CheckTarget, EntryHealth};

/// Result of one full poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSummary {
    pub score: Score,
    pub entry_count: usize,
    /// Checks that ended in a probe error or timeout.
    pub failed: usize,
    pub completed_at: Timestamp,
}

/// What a single check observed, whether or not it was recorded.
#[derive(Debug, Clone)]
pub(crate) struct CheckOutcome {
    pub status: HealthStatus,
    pub score: Score,
    pub error: Option<ProbeError>,
    pub elapsed: Duration,
}

impl HealthEngine {
    /// Check every registered entry concurrently, then refresh the platform
    /// score, alert thresholds and aggregated metrics.
    pub async fn poll_all(&self) -> Result<PollSummary, CoreError> {
        if self.is_destroyed() {
            return Err(CoreError::ShutDown);
        }

        let targets = self.registry.check_targets().await;
        let outcomes = join_all(targets.iter().map(|target| self.execute_check(target))).await;

        if self.is_destroyed() {
            return Err(CoreError::ShutDown);
        }

        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        let score = self.refresh_platform_score().await;
        let now = Utc::now();

        let drafts = self.thresholds.lock().await.evaluate(score, now);
        for draft in drafts {
            self.add_alert(draft.level, draft.message, draft.subject)
                .await;
        }

        self.refresh_metrics().await;
        self.platform.write().await.last_poll_at = Some(now);

        let entry_count = targets.len();
        self.publish(HealthEvent::PollCompleted {
            score,
            entry_count,
            timestamp: now,
        });
        tracing::info!(score, entry_count, failed, "Health poll completed");

        Ok(PollSummary {
            score,
            entry_count,
            failed,
            completed_at: now,
        })
    }

    /// Check one entry now and return its updated state.
    pub async fn check_entry(&self, name: &str) -> Result<EntryHealth, CoreError> {
        if self.is_destroyed() {
            return Err(CoreError::ShutDown);
        }
        let target = self
            .registry
            .check_target(name)
            .await
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;

        self.execute_check(&target).await;
        self.refresh_platform_score().await;

        self.registry
            .health(name)
            .await
            .ok_or_else(|| CoreError::NotFound(name.to_string()))
    }

    /// Run one probe and record the result against its registration.
    pub(crate) async fn execute_check(&self, target: &CheckTarget) -> CheckOutcome {
        let started = Instant::now();
        let probed = target.probe.check(self.config.check_timeout).await;
        let elapsed = started.elapsed();
        let checked_at = Utc::now();

        let (result, error) = match probed {
            Ok(value) => {
                let status = resolve_status(Some(&value));
                let score = score_for(status, Some(&value));
                let result = CheckResult {
                    status,
                    score,
                    probe_result: value,
                    checked_at,
                };
                (result, None)
            }
            Err(e) => {
                tracing::warn!(entry = %target.name, error = %e, "Health check failed");
                let result = CheckResult {
                    status: HealthStatus::Unresponsive,
                    score: 0,
                    probe_result: json!({ "error": e.to_string() }),
                    checked_at,
                };
                (result, Some(e))
            }
        };

        let outcome = CheckOutcome {
            status: result.status,
            score: result.score,
            error: error.clone(),
            elapsed,
        };

        if self.is_destroyed() {
            return outcome;
        }
        let Some(applied) = self.registry.apply(target, result).await else {
            tracing::debug!(entry = %target.name, "Discarded result for a registration that no longer exists");
            return outcome;
        };

        if let Some(e) = error {
            self.add_alert(
                AlertLevel::Critical,
                format!("Health check failed for {}: {e}", target.name),
                target.name.as_str(),
            )
            .await;
        }
        self.track_transition(&target.name, applied).await;

        outcome
    }

    /// Publish and alert on a change of health bucket.
    async fn track_transition(&self, name: &str, applied: AppliedCheck) {
        let Some(transition) = Transition::classify(applied.previous_status, applied.status)
        else {
            return;
        };

        match transition {
            Transition::Degraded { to, .. } => {
                tracing::warn!(
                    entry = %name,
                    status = %to,
                    consecutive_bad_checks = applied.consecutive_bad_checks,
                    "Entry degraded",
                );
                self.publish(HealthEvent::EntryDegraded {
                    name: name.to_string(),
                    status: to,
                });
            }
            Transition::Recovered { from } => {
                tracing::info!(entry = %name, previous_status = %from, "Entry recovered");
                self.publish(HealthEvent::EntryRecovered {
                    name: name.to_string(),
                    previous_status: from,
                });
            }
        }

        self.add_alert(transition.alert_level(), transition.message(name), name)
            .await;
    }
}
