//! Aggregated platform metrics.
//!
//! Counters come from each entry's last probe result; cache, scheduler and
//! error statistics come from the injected companions. A missing or failing
//! companion leaves its section empty.

use chrono::Utc;
use vigil_core::metrics::{AggregatedMetrics, SchedulerSummary};

use crate::companions::Companions;
use crate::engine::HealthEngine;

impl HealthEngine {
    /// Rebuild [`AggregatedMetrics`] from the current entry state.
    pub(crate) async fn refresh_metrics(&self) -> AggregatedMetrics {
        let from_entries = self
            .registry
            .with_entries(|entries| {
                AggregatedMetrics::from_probe_results(
                    entries.map(|e| (e.name.as_str(), e.last_probe_result.as_ref())),
                    Utc::now(),
                )
            })
            .await;

        let metrics = with_companion_stats(from_entries, &self.companions);
        *self.metrics.write().await = metrics.clone();
        metrics
    }
}

fn with_companion_stats(mut metrics: AggregatedMetrics, companions: &Companions) -> AggregatedMetrics {
    if let Some(cache) = &companions.cache {
        match cache.stats() {
            Ok(stats) => metrics = metrics.with_cache(stats),
            Err(e) => tracing::debug!(error = %e, "Skipping cache statistics"),
        }
    }

    if let Some(scheduler) = &companions.scheduler {
        match scheduler.stats() {
            Ok(stats) => {
                metrics = metrics.with_scheduler(SchedulerSummary::new(
                    stats.scheduled,
                    stats.executed,
                    stats.missed,
                ))
            }
            Err(e) => tracing::debug!(error = %e, "Skipping scheduler statistics"),
        }
    }

    if let Some(errors) = &companions.errors {
        match errors.error_count() {
            Ok(count) => metrics = metrics.with_error_count(count),
            Err(e) => tracing::debug!(error = %e, "Skipping error counter"),
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vigil_core::metrics::CacheSummary;

    use super::*;
    use crate::companions::{
        CacheStatsProvider, CompanionError, ErrorCounter, SchedulerStats, SchedulerStatsProvider,
    };

    struct Cache;

    impl CacheStatsProvider for Cache {
        fn stats(&self) -> Result<CacheSummary, CompanionError> {
            Ok(CacheSummary {
                hit_rate: 0.8,
                hits: 80,
                misses: 20,
            })
        }
    }

    struct BrokenScheduler;

    impl SchedulerStatsProvider for BrokenScheduler {
        fn stats(&self) -> Result<SchedulerStats, CompanionError> {
            Err(CompanionError("scheduler stopped".into()))
        }
    }

    struct Errors(u64);

    impl ErrorCounter for Errors {
        fn error_count(&self) -> Result<u64, CompanionError> {
            Ok(self.0)
        }
    }

    #[test]
    fn absent_companions_leave_metrics_untouched() {
        let metrics = with_companion_stats(AggregatedMetrics::default(), &Companions::default());
        assert_eq!(metrics, AggregatedMetrics::default());
    }

    #[test]
    fn failing_companion_is_skipped() {
        let companions = Companions::default()
            .with_cache(Arc::new(Cache))
            .with_scheduler(Arc::new(BrokenScheduler))
            .with_error_counter(Arc::new(Errors(4)));

        let metrics = with_companion_stats(AggregatedMetrics::default(), &companions);

        assert_eq!(metrics.cache.map(|c| c.hits), Some(80));
        assert!(metrics.scheduler.is_none());
        assert_eq!(metrics.companion_error_count, Some(4));
        assert_eq!(metrics.total_errors, 4);
    }
}
