//! Health alerts and the deduplicating, bounded alert log.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Timestamp;

/// Subject used for alerts about the platform as a whole rather than a
/// single entry.
pub const PLATFORM_SUBJECT: &str = "_platform";

// ---------------------------------------------------------------------------
// AlertLevel
// ---------------------------------------------------------------------------

/// Severity of a health alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HealthAlert
// ---------------------------------------------------------------------------

/// A single alert raised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthAlert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub message: String,
    /// Entry name, or [`PLATFORM_SUBJECT`].
    pub subject: String,
    pub created_at: Timestamp,
    pub resolved: bool,
    pub resolved_at: Option<Timestamp>,
}

impl HealthAlert {
    /// Whether this alert is an unresolved duplicate of the given key,
    /// created less than `window` before `now`.
    fn suppresses(
        &self,
        level: AlertLevel,
        subject: &str,
        message: &str,
        now: Timestamp,
        window: Duration,
    ) -> bool {
        if self.resolved || self.level != level || self.subject != subject || self.message != message
        {
            return false;
        }
        // A creation time in the future (clock skew) counts as inside the window.
        now.signed_duration_since(self.created_at)
            .to_std()
            .map_or(true, |elapsed| elapsed < window)
    }
}

// ---------------------------------------------------------------------------
// AlertSummary
// ---------------------------------------------------------------------------

/// Aggregate alert counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub unresolved: usize,
    /// Unresolved critical alerts.
    pub critical: usize,
    /// Unresolved warning alerts.
    pub warning: usize,
}

// ---------------------------------------------------------------------------
// AlertLog
// ---------------------------------------------------------------------------

/// Ordered alert log, oldest first.
///
/// Identical unresolved alerts are suppressed for `dedup_window`, and the
/// log is trimmed from the front once it grows past `max_alerts`.
#[derive(Debug)]
pub struct AlertLog {
    alerts: VecDeque<HealthAlert>,
    max_alerts: usize,
    dedup_window: Duration,
}

impl AlertLog {
    pub fn new(max_alerts: usize, dedup_window: Duration) -> Self {
        Self {
            alerts: VecDeque::new(),
            max_alerts,
            dedup_window,
        }
    }

    /// Record a new alert unless an identical one is still fresh.
    ///
    /// Returns the stored alert, or `None` when it was deduplicated.
    pub fn raise(
        &mut self,
        level: AlertLevel,
        message: impl Into<String>,
        subject: impl Into<String>,
        now: Timestamp,
    ) -> Option<HealthAlert> {
        let message = message.into();
        let subject = subject.into();

        if self
            .alerts
            .iter()
            .any(|a| a.suppresses(level, &subject, &message, now, self.dedup_window))
        {
            return None;
        }

        let alert = HealthAlert {
            id: Uuid::new_v4(),
            level,
            message,
            subject,
            created_at: now,
            resolved: false,
            resolved_at: None,
        };
        self.alerts.push_back(alert.clone());

        while self.alerts.len() > self.max_alerts {
            self.alerts.pop_front();
        }

        Some(alert)
    }

    /// Mark an alert resolved.
    ///
    /// Returns `false` if no such alert exists or it is already resolved.
    pub fn resolve(&mut self, id: Uuid, now: Timestamp) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) if !alert.resolved => {
                alert.resolved = true;
                alert.resolved_at = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&HealthAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// All alerts, oldest first. Reverse it for newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HealthAlert> {
        self.alerts.iter()
    }

    /// The newest `limit` unresolved alerts, newest first.
    pub fn recent_unresolved(&self, limit: usize) -> Vec<HealthAlert> {
        self.alerts
            .iter()
            .rev()
            .filter(|a| !a.resolved)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> AlertSummary {
        self.alerts
            .iter()
            .fold(AlertSummary::default(), |mut summary, alert| {
                summary.total += 1;
                if !alert.resolved {
                    summary.unresolved += 1;
                    match alert.level {
                        AlertLevel::Critical => summary.critical += 1,
                        AlertLevel::Warning => summary.warning += 1,
                        AlertLevel::Info => {}
                    }
                }
                summary
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
