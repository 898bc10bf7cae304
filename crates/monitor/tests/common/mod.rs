#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, Notify};
use vigil_events::HealthEvent;
use vigil_monitor::{Companions, HealthEngine, HealthProbe, MonitorConfig, ProbeError};

/// A config with a short check timeout so timeout tests stay fast.
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        check_timeout: Duration::from_millis(100),
        ..MonitorConfig::default()
    }
}

pub fn test_engine() -> Arc<HealthEngine> {
    HealthEngine::new(test_config(), Companions::default())
}

/// Drain every event currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<HealthEvent>) -> Vec<HealthEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

/// Always reports the same value.
pub struct FixedProbe(pub Value);

impl FixedProbe {
    pub fn new(value: Value) -> Arc<Self> {
        Arc::new(Self(value))
    }
}

#[async_trait]
impl HealthProbe for FixedProbe {
    async fn check_health(&self) -> Result<Value, ProbeError> {
        Ok(self.0.clone())
    }
}

/// Always fails with the given reason.
pub struct FailingProbe(pub &'static str);

#[async_trait]
impl HealthProbe for FailingProbe {
    async fn check_health(&self) -> Result<Value, ProbeError> {
        Err(ProbeError::Failed(self.0.to_string()))
    }
}

/// Takes `delay` to answer and records whether it ever finished.
pub struct SlowProbe {
    pub delay: Duration,
    pub finished: AtomicBool,
}

impl SlowProbe {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            finished: AtomicBool::new(false),
        })
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for SlowProbe {
    async fn check_health(&self) -> Result<Value, ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(Value::String("healthy".into()))
    }
}

/// Signals when a check starts, then waits to be released before answering.
pub struct GatedProbe {
    pub result: Value,
    pub started: Notify,
    pub release: Notify,
}

impl GatedProbe {
    pub fn new(result: Value) -> Arc<Self> {
        Arc::new(Self {
            result,
            started: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl HealthProbe for GatedProbe {
    async fn check_health(&self) -> Result<Value, ProbeError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.result.clone())
    }
}
