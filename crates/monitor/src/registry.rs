//! Keyed collection of monitored entries.
//!
//! The registry owns entry state. Probes never run under its lock: the
//! poller takes a [`CheckTarget`] copy of every entry, runs the checks, and
//! writes each result back with [`Registry::apply`]. Each registration gets
//! a fresh id so a result for an entry that was removed (or removed and
//! registered again) while its check was in flight is discarded.

use std::collections::{hash_map, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use vigil_core::degradation::next_bad_check_count;
use vigil_core::scoring::MAX_SCORE;
use vigil_core::{CoreError, HealthStatus, Score, Timestamp};

use crate::probe::ProbeHandle;

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// One registered collaborator.
#[derive(Debug)]
pub struct MonitoredEntry {
    pub name: String,
    pub probe: ProbeHandle,
    registration_id: u64,
    pub status: HealthStatus,
    pub score: Score,
    pub last_checked_at: Option<Timestamp>,
    pub registered_at: Timestamp,
    pub consecutive_bad_checks: u32,
    pub last_probe_result: Option<Value>,
}

impl MonitoredEntry {
    fn new(name: String, probe: ProbeHandle, registration_id: u64, now: Timestamp) -> Self {
        Self {
            name,
            probe,
            registration_id,
            status: HealthStatus::Healthy,
            score: MAX_SCORE,
            last_checked_at: None,
            registered_at: now,
            consecutive_bad_checks: 0,
            last_probe_result: None,
        }
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            name: self.name.clone(),
            status: self.status,
            score: self.score,
            last_checked_at: self.last_checked_at,
        }
    }

    pub fn health(&self) -> EntryHealth {
        EntryHealth {
            name: self.name.clone(),
            probe_kind: self.probe.kind(),
            status: self.status,
            score: self.score,
            last_checked_at: self.last_checked_at,
            registered_at: self.registered_at,
            consecutive_bad_checks: self.consecutive_bad_checks,
            last_probe_result: self.last_probe_result.clone(),
        }
    }
}

/// Compact per-entry view for dashboards and issue lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub name: String,
    pub status: HealthStatus,
    pub score: Score,
    pub last_checked_at: Option<Timestamp>,
}

/// Full per-entry detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryHealth {
    pub name: String,
    pub probe_kind: &'static str,
    pub status: HealthStatus,
    pub score: Score,
    pub last_checked_at: Option<Timestamp>,
    pub registered_at: Timestamp,
    pub consecutive_bad_checks: u32,
    pub last_probe_result: Option<Value>,
}

/// A stable copy of what is needed to check one entry.
#[derive(Debug, Clone)]
pub struct CheckTarget {
    pub name: String,
    pub probe: ProbeHandle,
    registration_id: u64,
}

/// The evaluated result of one check, ready to be written back.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub status: HealthStatus,
    pub score: Score,
    pub probe_result: Value,
    pub checked_at: Timestamp,
}

/// What changed when a result was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedCheck {
    pub previous_status: HealthStatus,
    pub status: HealthStatus,
    pub score: Score,
    pub consecutive_bad_checks: u32,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, MonitoredEntry>>,
    next_registration_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Fails if the name is blank or already taken.
    pub async fn insert(
        &self,
        name: &str,
        probe: ProbeHandle,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(
                "entry name must not be empty".to_string(),
            ));
        }
        let mut entries = self.entries.write().await;
        if entries.contains_key(name) {
            return Err(CoreError::DuplicateName(name.to_string()));
        }
        let id = self.next_registration_id.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            name.to_string(),
            MonitoredEntry::new(name.to_string(), probe, id, now),
        );
        Ok(())
    }

    /// Remove an entry. Returns whether it existed.
    pub async fn remove(&self, name: &str) -> bool {
        self.entries.write().await.remove(name).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of every entry's check target, sorted by name.
    pub async fn check_targets(&self) -> Vec<CheckTarget> {
        let entries = self.entries.read().await;
        let mut targets: Vec<_> = entries.values().map(Self::target_of).collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        targets
    }

    pub async fn check_target(&self, name: &str) -> Option<CheckTarget> {
        self.entries.read().await.get(name).map(Self::target_of)
    }

    fn target_of(entry: &MonitoredEntry) -> CheckTarget {
        CheckTarget {
            name: entry.name.clone(),
            probe: entry.probe.clone(),
            registration_id: entry.registration_id,
        }
    }

    /// Write a check result back to the entry it was taken from.
    ///
    /// Returns `None` (and writes nothing) if that registration no longer
    /// exists.
    pub async fn apply(&self, target: &CheckTarget, result: CheckResult) -> Option<AppliedCheck> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&target.name)
            .filter(|e| e.registration_id == target.registration_id)?;

        let previous_status = entry.status;
        entry.status = result.status;
        entry.score = result.score.min(MAX_SCORE);
        entry.last_checked_at = Some(result.checked_at);
        entry.last_probe_result = Some(result.probe_result);
        entry.consecutive_bad_checks =
            next_bad_check_count(entry.consecutive_bad_checks, result.status);

        Some(AppliedCheck {
            previous_status,
            status: entry.status,
            score: entry.score,
            consecutive_bad_checks: entry.consecutive_bad_checks,
        })
    }

    /// Run `f` over all entries under a single read lock.
    pub async fn with_entries<R>(
        &self,
        f: impl FnOnce(hash_map::Values<'_, String, MonitoredEntry>) -> R,
    ) -> R {
        let entries = self.entries.read().await;
        f(entries.values())
    }

    pub async fn health(&self, name: &str) -> Option<EntryHealth> {
        self.entries.read().await.get(name).map(MonitoredEntry::health)
    }

    /// Summaries of every entry, sorted by name.
    pub async fn summaries(&self) -> Vec<EntrySummary> {
        let mut summaries = self
            .with_entries(|entries| entries.map(MonitoredEntry::summary).collect::<Vec<_>>())
            .await;
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
