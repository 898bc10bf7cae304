//! Per-entry status transition tracking.
//!
//! Only bucket changes matter: healthy to anything else is a degradation,
//! anything else back to healthy is a recovery. Moving between the
//! non-healthy states (degraded to unhealthy, say) is not reported.

use crate::alert::AlertLevel;
use crate::status::HealthStatus;

/// A reportable change in an entry's health bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Degraded {
        to: HealthStatus,
        /// `Critical` when the entry is now failing, `Warning` otherwise.
        level: AlertLevel,
    },
    Recovered {
        from: HealthStatus,
    },
}

impl Transition {
    /// Classify a status change. Returns `None` for same-bucket moves.
    pub fn classify(previous: HealthStatus, current: HealthStatus) -> Option<Self> {
        match (previous.is_healthy(), current.is_healthy()) {
            (true, false) => Some(Transition::Degraded {
                to: current,
                level: if current.is_failing() {
                    AlertLevel::Critical
                } else {
                    AlertLevel::Warning
                },
            }),
            (false, true) => Some(Transition::Recovered { from: previous }),
            _ => None,
        }
    }

    pub fn alert_level(&self) -> AlertLevel {
        match self {
            Transition::Degraded { level, .. } => *level,
            Transition::Recovered { .. } => AlertLevel::Info,
        }
    }

    /// Alert message for `entry`.
    pub fn message(&self, entry: &str) -> String {
        match self {
            Transition::Degraded { to, .. } => format!("{entry} is {to}"),
            Transition::Recovered { from } => format!("{entry} recovered (was {from})"),
        }
    }
}

/// Consecutive non-healthy check count after a check with `status`.
pub fn next_bad_check_count(previous: u32, status: HealthStatus) -> u32 {
    if status.is_healthy() {
        0
    } else {
        previous.saturating_add(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::status::HealthStatus::*;

    #[test]
    fn healthy_to_degraded_is_a_warning() {
        let t = Transition::classify(Healthy, Degraded).expect("transition");
        assert_eq!(t.alert_level(), AlertLevel::Warning);
        assert_eq!(t.message("sprinkler"), "sprinkler is degraded");
    }

    #[test]
    fn healthy_to_failing_is_critical() {
        for to in [Unhealthy, Unresponsive] {
            let t = Transition::classify(Healthy, to).expect("transition");
            assert_eq!(t.alert_level(), AlertLevel::Critical);
        }
    }

    #[test]
    fn back_to_healthy_is_a_recovery() {
        let t = Transition::classify(Unresponsive, Healthy).expect("transition");
        assert_eq!(t, Transition::Recovered { from: Unresponsive });
        assert_eq!(t.alert_level(), AlertLevel::Info);
    }

    #[test]
    fn same_bucket_moves_are_silent() {
        assert!(Transition::classify(Healthy, Healthy).is_none());
        assert!(Transition::classify(Degraded, Unhealthy).is_none());
        assert!(Transition::classify(Unhealthy, Unresponsive).is_none());
    }

    #[test]
    fn bad_check_counter() {
        assert_eq!(next_bad_check_count(0, Degraded), 1);
        assert_eq!(next_bad_check_count(4, Unresponsive), 5);
        assert_eq!(next_bad_check_count(4, Healthy), 0);
        assert_eq!(next_bad_check_count(u32::MAX, Unhealthy), u32::MAX);
    }
}
