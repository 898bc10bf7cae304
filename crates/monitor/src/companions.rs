//! Companion collaborators consulted for supplementary statistics.
//!
//! Companions are injected at construction time through [`Companions`].
//! Every one of them is optional and best-effort: an absent companion or a
//! failing call simply leaves its contribution out of the report.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use vigil_core::metrics::CacheSummary;

/// Error returned by a companion that could not produce its statistics.
#[derive(Debug, thiserror::Error)]
#[error("companion unavailable: {0}")]
pub struct CompanionError(pub String);

/// Raw scheduler counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub scheduled: u64,
    pub executed: u64,
    pub missed: u64,
}

/// Reading reported by the memory guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryReading {
    /// Status word as reported by the guard.
    pub status: String,
    pub heap_used_mb: f64,
    pub heap_limit_mb: f64,
}

impl MemoryReading {
    pub fn usage_percent(&self) -> Option<f64> {
        (self.heap_limit_mb > 0.0).then(|| self.heap_used_mb * 100.0 / self.heap_limit_mb)
    }
}

pub trait CacheStatsProvider: Send + Sync {
    fn stats(&self) -> Result<CacheSummary, CompanionError>;
}

pub trait SchedulerStatsProvider: Send + Sync {
    fn stats(&self) -> Result<SchedulerStats, CompanionError>;
}

pub trait ErrorCounter: Send + Sync {
    fn error_count(&self) -> Result<u64, CompanionError>;
}

#[async_trait]
pub trait MemoryGuard: Send + Sync {
    async fn check(&self) -> Result<MemoryReading, CompanionError>;
}

/// The set of companions available to the engine.
#[derive(Clone, Default)]
pub struct Companions {
    pub cache: Option<Arc<dyn CacheStatsProvider>>,
    pub scheduler: Option<Arc<dyn SchedulerStatsProvider>>,
    pub errors: Option<Arc<dyn ErrorCounter>>,
    pub memory_guard: Option<Arc<dyn MemoryGuard>>,
}

impl Companions {
    pub fn with_cache(mut self, cache: Arc<dyn CacheStatsProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn SchedulerStatsProvider>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_error_counter(mut self, errors: Arc<dyn ErrorCounter>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_memory_guard(mut self, guard: Arc<dyn MemoryGuard>) -> Self {
        self.memory_guard = Some(guard);
        self
    }
}
