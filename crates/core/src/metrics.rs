//! Cross-entry performance counters.
//!
//! [`AggregatedMetrics`] is rebuilt after every poll from the entries' last
//! probe results, then enriched with whatever the companion collaborators
//! were able to report.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::fields;
use crate::types::Timestamp;

/// Cache statistics reported by the cache companion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheSummary {
    /// Hit rate in `0.0..=1.0`.
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
}

/// Scheduler statistics reported by the scheduling companion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchedulerSummary {
    pub scheduled: u64,
    pub executed: u64,
    pub missed: u64,
    /// Executed jobs as a percentage of scheduled ones (100 when idle).
    pub efficiency_percent: f64,
}

impl SchedulerSummary {
    pub fn new(scheduled: u64, executed: u64, missed: u64) -> Self {
        let efficiency_percent = if scheduled == 0 {
            100.0
        } else {
            (executed as f64 * 100.0 / scheduled as f64).min(100.0)
        };
        Self {
            scheduled,
            executed,
            missed,
            efficiency_percent,
        }
    }
}

/// Platform-wide counters derived from the current entry state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedMetrics {
    pub total_api_calls: u64,
    /// Entry-reported errors plus the error companion's count.
    pub total_errors: u64,
    /// Memory usage in megabytes, per entry that reports it.
    pub memory_usage_mb: BTreeMap<String, f64>,
    pub cache: Option<CacheSummary>,
    pub scheduler: Option<SchedulerSummary>,
    /// Count reported by the error companion, when available.
    pub companion_error_count: Option<u64>,
    pub computed_at: Option<Timestamp>,
}

impl AggregatedMetrics {
    /// Sum the known counters across `(name, last_probe_result)` pairs.
    pub fn from_probe_results<'a>(
        results: impl IntoIterator<Item = (&'a str, Option<&'a Value>)>,
        computed_at: Timestamp,
    ) -> Self {
        let mut metrics = Self {
            computed_at: Some(computed_at),
            ..Self::default()
        };

        for (name, result) in results {
            let Some(result) = result else { continue };

            if let Some(calls) = fields::number(result, fields::API_CALL_KEYS) {
                metrics.total_api_calls += fields::counter(calls);
            }
            if let Some(errors) = fields::number(result, fields::ERROR_COUNT_KEYS) {
                metrics.total_errors += fields::counter(errors);
            }
            if let Some(memory) = fields::number(result, fields::MEMORY_MB_KEYS) {
                metrics.memory_usage_mb.insert(name.to_string(), memory);
            }
        }

        metrics
    }

    pub fn with_cache(mut self, cache: CacheSummary) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerSummary) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Record the error companion's count and fold it into `total_errors`.
    pub fn with_error_count(mut self, count: u64) -> Self {
        self.companion_error_count = Some(count);
        self.total_errors += count;
        self
    }

    /// Total memory reported across all entries.
    pub fn total_memory_mb(&self) -> f64 {
        self.memory_usage_mb.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    #[test]
    fn sums_known_fields_across_entries() {
        let a = json!({"apiCalls": 10, "errorCount": 2, "memoryUsageMB": 64.5});
        let b = json!({"totalCalls": 5, "errors": 1, "memoryUsage": 32});
        let c = json!({"status": "ok", "errors": ["stale reading"]});

        let metrics = AggregatedMetrics::from_probe_results(
            [
                ("sprinkler", Some(&a)),
                ("purifier", Some(&b)),
                ("charger", Some(&c)),
                ("thermostat", None),
            ],
            Utc::now(),
        );

        assert_eq!(metrics.total_api_calls, 15);
        assert_eq!(metrics.total_errors, 3);
        assert_eq!(metrics.memory_usage_mb.len(), 2);
        assert_eq!(metrics.memory_usage_mb["sprinkler"], 64.5);
        assert_eq!(metrics.total_memory_mb(), 96.5);
    }

    #[test]
    fn companion_contributions() {
        let metrics = AggregatedMetrics::from_probe_results(std::iter::empty(), Utc::now())
            .with_cache(CacheSummary {
                hit_rate: 0.8,
                hits: 80,
                misses: 20,
            })
            .with_scheduler(SchedulerSummary::new(10, 9, 1))
            .with_error_count(4);

        assert_eq!(metrics.total_errors, 4);
        assert_eq!(metrics.companion_error_count, Some(4));
        let scheduler = metrics.scheduler.expect("scheduler summary");
        assert_eq!(scheduler.efficiency_percent, 90.0);
        assert!(metrics.cache.is_some());
    }

    #[test]
    fn idle_scheduler_is_fully_efficient() {
        assert_eq!(SchedulerSummary::new(0, 0, 0).efficiency_percent, 100.0);
    }
}
