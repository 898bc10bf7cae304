//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`HealthEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` or owned by the engine that
//! publishes on it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use vigil_core::{HealthAlert, HealthStatus, Score};

// ---------------------------------------------------------------------------
// HealthEvent
// ---------------------------------------------------------------------------

/// An event published by the health engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthEvent {
    /// A full poll finished and the platform score was recomputed.
    PollCompleted {
        score: Score,
        entry_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A new (non-deduplicated) alert was stored.
    AlertRaised { alert: HealthAlert },

    /// An entry left the healthy bucket.
    EntryDegraded { name: String, status: HealthStatus },

    /// An entry returned to healthy.
    EntryRecovered {
        name: String,
        previous_status: HealthStatus,
    },
}

impl HealthEvent {
    /// Dot-separated event name, e.g. `"health.poll_completed"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            HealthEvent::PollCompleted { .. } => "health.poll_completed",
            HealthEvent::AlertRaised { .. } => "health.alert_raised",
            HealthEvent::EntryDegraded { .. } => "health.entry_degraded",
            HealthEvent::EntryRecovered { .. } => "health.entry_recovered",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of [`HealthEvent`]s to every current subscriber.
///
/// Subscribers that fall more than the channel capacity behind lose the
/// oldest events and see `RecvError::Lagged`.
///
/// ```rust
/// use vigil_events::bus::{EventBus, HealthEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(HealthEvent::EntryDegraded {
///     name: "sprinkler".into(),
///     status: vigil_core::HealthStatus::Degraded,
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
pub struct EventBus {
    sender: broadcast::Sender<HealthEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: HealthEvent) {
        tracing::trace!(event_type = event.event_type(), "Publishing health event");
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<HealthEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
