//! Point-in-time health rollups and the bounded rolling history.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::scoring::overall_score;
use crate::status::HealthStatus;
use crate::types::{Score, Timestamp};

/// Immutable rollup of every entry's score at one moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub taken_at: Timestamp,
    pub overall_score: Score,
    pub scores: BTreeMap<String, Score>,
    pub healthy: usize,
    pub degraded: usize,
    /// Unhealthy and unresponsive entries.
    pub unhealthy: usize,
}

impl HealthSnapshot {
    /// Build a snapshot from `(name, status, score)` triples.
    pub fn capture<'a>(
        entries: impl IntoIterator<Item = (&'a str, HealthStatus, Score)>,
        taken_at: Timestamp,
    ) -> Self {
        let mut scores = BTreeMap::new();
        let (mut healthy, mut degraded, mut unhealthy) = (0, 0, 0);

        for (name, status, score) in entries {
            match status {
                HealthStatus::Healthy => healthy += 1,
                HealthStatus::Degraded => degraded += 1,
                HealthStatus::Unhealthy | HealthStatus::Unresponsive => unhealthy += 1,
            }
            scores.insert(name.to_string(), score);
        }

        Self {
            taken_at,
            overall_score: overall_score(scores.values().copied()),
            scores,
            healthy,
            degraded,
            unhealthy,
        }
    }
}

/// Rolling snapshot history, oldest first, capped at `max_len`.
#[derive(Debug)]
pub struct SnapshotHistory {
    snapshots: VecDeque<HealthSnapshot>,
    max_len: usize,
}

impl SnapshotHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(max_len.min(1024)),
            max_len,
        }
    }

    /// Append a snapshot, dropping the oldest ones past the cap.
    pub fn record(&mut self, snapshot: HealthSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.max_len {
            self.snapshots.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn latest(&self) -> Option<&HealthSnapshot> {
        self.snapshots.back()
    }

    /// Snapshots taken at or after `cutoff`, oldest first.
    pub fn since(&self, cutoff: Timestamp) -> Vec<HealthSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.taken_at >= cutoff)
            .cloned()
            .collect()
    }

    /// Percentage of snapshots whose overall score met `threshold`.
    ///
    /// An empty history reports 100.
    pub fn uptime_percent(&self, threshold: Score) -> f64 {
        if self.snapshots.is_empty() {
            return 100.0;
        }
        let up = self
            .snapshots
            .iter()
            .filter(|s| s.overall_score >= threshold)
            .count();
        up as f64 * 100.0 / self.snapshots.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
