//! Health-monitoring aggregation engine.
//!
//! [`HealthEngine`] polls registered collaborators through their
//! [`ProbeHandle`]s, scores them, tracks degradation, raises deduplicated
//! alerts and keeps a rolling score history. Results are exposed through
//! read-only query methods and broadcast as [`vigil_events::HealthEvent`]s.

mod background;
pub mod companions;
pub mod config;
pub mod diagnostics;
pub mod engine;
mod performance;
pub mod poller;
pub mod probe;
pub mod query;
pub mod registry;

pub use companions::Companions;
pub use config::{ConfigError, MonitorConfig};
pub use diagnostics::{DiagnosticsReport, EntryDiagnostic, Verdict};
pub use engine::HealthEngine;
pub use poller::PollSummary;
pub use probe::{HealthProbe, HealthSource, ProbeError, ProbeHandle};
pub use query::{Dashboard, PerformanceReport};
pub use registry::{EntryHealth, EntrySummary};
