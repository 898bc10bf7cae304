//! Platform score threshold evaluation.
//!
//! [`ThresholdMonitor`] watches the platform score across polls and decides
//! when to alert. Two triggers are tracked independently:
//!
//! - **Crossing**: the score drops below the threshold after being at or
//!   above it on the previous poll.
//! - **Sustained degradation**: the score stays below the threshold for at
//!   least `sustained_for`. This fires once per episode; the episode ends
//!   when the score returns to the threshold or above.

use std::time::Duration;

use crate::alert::{AlertLevel, PLATFORM_SUBJECT};
use crate::scoring::MAX_SCORE;
use crate::types::{Score, Timestamp};

/// An alert the caller should raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDraft {
    pub level: AlertLevel,
    pub subject: String,
    pub message: String,
}

impl AlertDraft {
    fn platform(level: AlertLevel, message: String) -> Self {
        Self {
            level,
            subject: PLATFORM_SUBJECT.to_string(),
            message,
        }
    }
}

/// Tracks the platform score between polls.
#[derive(Debug)]
pub struct ThresholdMonitor {
    threshold: Score,
    sustained_for: Duration,
    previous_score: Score,
    below_since: Option<Timestamp>,
    sustained_fired: bool,
}

impl ThresholdMonitor {
    pub fn new(threshold: Score, sustained_for: Duration) -> Self {
        Self {
            threshold,
            sustained_for,
            previous_score: MAX_SCORE,
            below_since: None,
            sustained_fired: false,
        }
    }

    pub fn threshold(&self) -> Score {
        self.threshold
    }

    /// When the current below-threshold episode started, if one is running.
    pub fn below_since(&self) -> Option<Timestamp> {
        self.below_since
    }

    /// Feed the score of a completed poll and return any alerts to raise.
    pub fn evaluate(&mut self, score: Score, now: Timestamp) -> Vec<AlertDraft> {
        let mut drafts = Vec::new();

        if score < self.threshold {
            if self.previous_score >= self.threshold {
                drafts.push(AlertDraft::platform(
                    AlertLevel::Warning,
                    format!(
                        "Platform health score fell below threshold {}",
                        self.threshold
                    ),
                ));
            }

            let since = *self.below_since.get_or_insert(now);
            let elapsed = now.signed_duration_since(since).to_std().unwrap_or_default();
            if !self.sustained_fired && elapsed >= self.sustained_for {
                self.sustained_fired = true;
                drafts.push(AlertDraft::platform(
                    AlertLevel::Critical,
                    format!(
                        "Platform health score has stayed below threshold {} for {} minutes",
                        self.threshold,
                        elapsed.as_secs() / 60,
                    ),
                ));
            }
        } else {
            self.below_since = None;
            self.sustained_fired = false;
        }

        self.previous_score = score;
        drafts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::*;

    const SUSTAINED: Duration = Duration::from_secs(600);

    fn count(drafts: &[AlertDraft], level: AlertLevel) -> usize {
        drafts.iter().filter(|d| d.level == level).count()
    }

    #[test]
    fn no_alerts_while_above_threshold() {
        let mut monitor = ThresholdMonitor::new(70, SUSTAINED);
        let now = Utc::now();
        assert!(monitor.evaluate(95, now).is_empty());
        assert!(monitor.evaluate(70, now).is_empty());
    }

    #[test]
    fn crossing_raises_one_warning() {
        let mut monitor = ThresholdMonitor::new(70, SUSTAINED);
        let now = Utc::now();

        let drafts = monitor.evaluate(60, now);
        assert_eq!(count(&drafts, AlertLevel::Warning), 1);
        assert_eq!(drafts[0].subject, PLATFORM_SUBJECT);

        // Still below: no new crossing.
        let drafts = monitor.evaluate(55, now + TimeDelta::seconds(30));
        assert_eq!(count(&drafts, AlertLevel::Warning), 0);
    }

    #[test]
    fn sustained_degradation_fires_exactly_once() {
        let mut monitor = ThresholdMonitor::new(70, SUSTAINED);
        let start = Utc::now();

        let mut critical = 0;
        // One poll every 30 seconds for 20 minutes, always below threshold.
        for i in 0..=40 {
            let drafts = monitor.evaluate(40, start + TimeDelta::seconds(30 * i));
            critical += count(&drafts, AlertLevel::Critical);
        }
        assert_eq!(critical, 1);
    }

    #[test]
    fn sustained_fires_when_window_elapses() {
        let mut monitor = ThresholdMonitor::new(70, SUSTAINED);
        let start = Utc::now();

        monitor.evaluate(40, start);
        let before = monitor.evaluate(40, start + TimeDelta::seconds(599));
        assert_eq!(count(&before, AlertLevel::Critical), 0);
        let at = monitor.evaluate(40, start + TimeDelta::seconds(600));
        assert_eq!(count(&at, AlertLevel::Critical), 1);
    }

    #[test]
    fn recovery_before_window_raises_no_sustained_alert() {
        let mut monitor = ThresholdMonitor::new(70, SUSTAINED);
        let start = Utc::now();

        let mut critical = 0;
        critical += count(&monitor.evaluate(40, start), AlertLevel::Critical);
        critical += count(
            &monitor.evaluate(40, start + TimeDelta::seconds(300)),
            AlertLevel::Critical,
        );
        critical += count(
            &monitor.evaluate(90, start + TimeDelta::seconds(500)),
            AlertLevel::Critical,
        );
        assert!(monitor.below_since().is_none());

        // A new episode starts its own timer.
        critical += count(
            &monitor.evaluate(40, start + TimeDelta::seconds(700)),
            AlertLevel::Critical,
        );
        critical += count(
            &monitor.evaluate(40, start + TimeDelta::seconds(1200)),
            AlertLevel::Critical,
        );
        assert_eq!(critical, 0);
    }

    #[test]
    fn recovery_rearms_sustained_alert() {
        let mut monitor = ThresholdMonitor::new(70, SUSTAINED);
        let start = Utc::now();

        monitor.evaluate(40, start);
        let first = monitor.evaluate(40, start + TimeDelta::seconds(600));
        assert_eq!(count(&first, AlertLevel::Critical), 1);

        monitor.evaluate(80, start + TimeDelta::seconds(660));
        monitor.evaluate(40, start + TimeDelta::seconds(720));
        let second = monitor.evaluate(40, start + TimeDelta::seconds(1320));
        assert_eq!(count(&second, AlertLevel::Critical), 1);
    }
}
