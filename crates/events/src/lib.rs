//! Vigil event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`HealthEvent`]: the events published by the health engine.

pub mod bus;

pub use bus::{EventBus, HealthEvent};
