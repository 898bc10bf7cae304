//! Canonical health states and the vocabulary resolver.
//!
//! Collaborators report their health in whatever words they like
//! (`"ok"`, `"RUNNING"`, `"warn"`, ...). [`resolve_status`] folds any probe
//! result into one of the four [`HealthStatus`] values.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields;
use crate::types::Score;

// ---------------------------------------------------------------------------
// HealthStatus
// ---------------------------------------------------------------------------

/// Canonical health state of a monitored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// The probe timed out, failed, or its collaborator is gone.
    Unresponsive,
}

impl HealthStatus {
    /// String representation used in messages and serialized views.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unresponsive => "unresponsive",
        }
    }

    /// Map a reported status word to a canonical state (case-insensitive).
    ///
    /// Returns `None` for words outside the known vocabulary.
    pub fn from_vocabulary(word: &str) -> Option<Self> {
        match word.trim().to_ascii_uppercase().as_str() {
            "HEALTHY" | "OK" | "GOOD" | "UP" | "ACTIVE" | "RUNNING" => Some(HealthStatus::Healthy),
            "DEGRADED" | "WARNING" | "WARN" | "PARTIAL" => Some(HealthStatus::Degraded),
            "UNHEALTHY" | "ERROR" | "CRITICAL" | "DOWN" | "FAILED" => {
                Some(HealthStatus::Unhealthy)
            }
            "UNRESPONSIVE" | "TIMEOUT" => Some(HealthStatus::Unresponsive),
            _ => None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// `Unhealthy` or `Unresponsive`.
    pub fn is_failing(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy | HealthStatus::Unresponsive)
    }

    /// Starting score before metric penalties are applied.
    pub fn base_score(&self) -> Score {
        match self {
            HealthStatus::Healthy => 100,
            HealthStatus::Degraded => 50,
            HealthStatus::Unhealthy | HealthStatus::Unresponsive => 0,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolve a raw probe result to a canonical status.
///
/// - `None` / `null` resolves to `Unhealthy`.
/// - A string is looked up in the vocabulary.
/// - A boolean maps `true` to `Healthy` and `false` to `Unhealthy`.
/// - An object is resolved from its `status` (or `state`) field.
///
/// When no recognized status is reported, a result carrying an `error` value
/// or a non-empty `errors` list is `Unhealthy`; anything else falls back to
/// `Healthy`. That optimistic fallback is a heuristic, not a guarantee: a
/// collaborator reporting an unknown word such as `"rebooting"` is treated
/// as healthy.
pub fn resolve_status(result: Option<&Value>) -> HealthStatus {
    let result = match result {
        None | Some(Value::Null) => return HealthStatus::Unhealthy,
        Some(result) => result,
    };

    let reported = match result {
        Value::String(word) => Some(word.as_str()),
        Value::Bool(true) => return HealthStatus::Healthy,
        Value::Bool(false) => return HealthStatus::Unhealthy,
        Value::Object(_) => fields::string(result, fields::STATUS_KEYS),
        _ => None,
    };

    if let Some(status) = reported.and_then(HealthStatus::from_vocabulary) {
        return status;
    }

    if fields::has_error_indicator(result) {
        return HealthStatus::Unhealthy;
    }

    tracing::debug!(
        reported = reported.unwrap_or("<none>"),
        "Unrecognized probe status, assuming healthy",
    );
    HealthStatus::Healthy
}

// ---------------------------------------------------------------------------
// StatusCounts
// ---------------------------------------------------------------------------

/// Number of entries in each status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub unresponsive: usize,
}

impl StatusCounts {
    /// Tally a sequence of statuses.
    pub fn tally(statuses: impl IntoIterator<Item = HealthStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            match status {
                HealthStatus::Healthy => counts.healthy += 1,
                HealthStatus::Degraded => counts.degraded += 1,
                HealthStatus::Unhealthy => counts.unhealthy += 1,
                HealthStatus::Unresponsive => counts.unresponsive += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.healthy + self.degraded + self.unhealthy + self.unresponsive
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
