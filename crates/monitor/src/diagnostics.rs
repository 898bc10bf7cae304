//! On-demand diagnostics across every registered entry.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use vigil_core::{CoreError, HealthStatus, Timestamp};

use crate::companions::MemoryReading;
use crate::engine::HealthEngine;
use crate::poller::CheckOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

impl Verdict {
    fn for_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => Verdict::Pass,
            HealthStatus::Degraded => Verdict::Warn,
            HealthStatus::Unhealthy | HealthStatus::Unresponsive => Verdict::Fail,
        }
    }
}

/// Result of diagnosing one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDiagnostic {
    pub status: HealthStatus,
    pub verdict: Verdict,
    pub message: String,
    pub elapsed_ms: u64,
}

impl EntryDiagnostic {
    fn from_outcome(name: &str, outcome: &CheckOutcome) -> Self {
        let message = match &outcome.error {
            Some(e) => format!("{name} check failed: {e}"),
            None if outcome.status.is_healthy() => format!("{name} is healthy"),
            None => format!("{name} reported {} (score {})", outcome.status, outcome.score),
        };
        Self {
            status: outcome.status,
            verdict: Verdict::for_status(outcome.status),
            message,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub started_at: Timestamp,
    pub verdict: Verdict,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub entries: BTreeMap<String, EntryDiagnostic>,
    /// Supplementary reading from the memory guard, when one is available.
    pub memory: Option<MemoryReading>,
}

impl HealthEngine {
    /// Re-check every entry concurrently and grade the results.
    ///
    /// Results are recorded like any other check, so diagnostics that
    /// overlap a poll simply race it for the last write.
    pub async fn run_diagnostics(&self) -> Result<DiagnosticsReport, CoreError> {
        if self.is_destroyed() {
            return Err(CoreError::ShutDown);
        }
        let started_at = Utc::now();
        let started = Instant::now();

        let targets = self.registry.check_targets().await;
        let checks = join_all(targets.iter().map(|target| self.execute_check(target)));
        let (outcomes, memory) = tokio::join!(checks, self.read_memory_guard());

        // The checks above rewrote entry scores.
        if !self.is_destroyed() {
            self.refresh_platform_score().await;
            self.refresh_metrics().await;
        }

        let entries: BTreeMap<_, _> = targets
            .iter()
            .zip(&outcomes)
            .map(|(target, outcome)| {
                (
                    target.name.clone(),
                    EntryDiagnostic::from_outcome(&target.name, outcome),
                )
            })
            .collect();

        let count = |verdict| entries.values().filter(|d| d.verdict == verdict).count();
        let (passed, warnings, failed) = (
            count(Verdict::Pass),
            count(Verdict::Warn),
            count(Verdict::Fail),
        );
        let verdict = if failed > 0 {
            Verdict::Fail
        } else if warnings > 0 {
            Verdict::Warn
        } else {
            Verdict::Pass
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(?verdict, passed, warnings, failed, elapsed_ms, "Diagnostics completed");

        Ok(DiagnosticsReport {
            started_at,
            verdict,
            passed,
            warnings,
            failed,
            elapsed_ms,
            entries,
            memory,
        })
    }

    async fn read_memory_guard(&self) -> Option<MemoryReading> {
        let guard = self.companions.memory_guard.as_ref()?;
        match tokio::time::timeout(self.config.check_timeout, guard.check()).await {
            Ok(Ok(reading)) => Some(reading),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Skipping memory guard reading");
                None
            }
            Err(_) => {
                tracing::debug!("Memory guard timed out");
                None
            }
        }
    }
}
