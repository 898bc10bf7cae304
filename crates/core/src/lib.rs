//! Pure health-evaluation logic for the Vigil monitoring engine.
//!
//! Nothing in this crate performs I/O or spawns tasks. The service crate
//! (`vigil-monitor`) feeds probe results, timestamps and scores in and acts
//! on what comes back, which keeps every rule here testable in isolation.

pub mod alert;
pub mod degradation;
pub mod error;
pub mod fields;
pub mod metrics;
pub mod scoring;
pub mod snapshot;
pub mod status;
pub mod thresholds;
pub mod types;

pub use alert::{AlertLevel, AlertLog, AlertSummary, HealthAlert, PLATFORM_SUBJECT};
pub use error::CoreError;
pub use status::{resolve_status, HealthStatus, StatusCounts};
pub use types::{Score, Timestamp};
