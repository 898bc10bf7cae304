//! The health-probe contract monitored collaborators expose.
//!
//! A collaborator opts in by implementing [`HealthProbe`] (an async call
//! returning a JSON health result), by publishing its health through a
//! `tokio::sync::watch` channel, or not at all ([`ProbeHandle::Passive`]).
//! The engine only ever holds a [`Weak`] reference to a probe: collaborators
//! own their lifecycle and a dropped collaborator simply fails its checks.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

/// Errors a health check can end with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("health check timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("collaborator is no longer available")]
    Dropped,

    #[error("{0}")]
    Failed(String),
}

/// Async health check implemented by monitored collaborators.
///
/// The returned value is interpreted by [`vigil_core::resolve_status`] and
/// [`vigil_core::scoring::score_for`]: a status word, a boolean, or an
/// object with `status`, `error`, `errorRate`, `memoryUsagePercent`,
/// `cacheHitRate`, `apiCalls`, `errorCount` and `memoryUsageMB` fields.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check_health(&self) -> Result<Value, ProbeError>;
}

/// How the engine reaches a collaborator's health.
#[derive(Clone)]
pub enum ProbeHandle {
    /// Invoke an async probe.
    Probe(Weak<dyn HealthProbe>),
    /// Read a health value the collaborator keeps current.
    Field(watch::Receiver<Value>),
    /// No capability exposed; always healthy.
    Passive,
}

impl ProbeHandle {
    /// Borrow a probe without taking ownership of it.
    pub fn probe<P: HealthProbe + 'static>(probe: &Arc<P>) -> Self {
        let probe: Arc<dyn HealthProbe> = probe.clone();
        Self::Probe(Arc::downgrade(&probe))
    }

    /// Borrow an already type-erased probe.
    pub fn from_dyn(probe: &Arc<dyn HealthProbe>) -> Self {
        Self::Probe(Arc::downgrade(probe))
    }

    pub fn field(receiver: watch::Receiver<Value>) -> Self {
        Self::Field(receiver)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProbeHandle::Probe(_) => "probe",
            ProbeHandle::Field(_) => "field",
            ProbeHandle::Passive => "passive",
        }
    }

    /// Run one health check, bounded by `timeout`.
    ///
    /// On timeout the probe future is dropped, so a slow probe can never
    /// deliver a result after the timeout has been recorded.
    pub async fn check(&self, timeout: Duration) -> Result<Value, ProbeError> {
        match self {
            ProbeHandle::Probe(weak) => {
                let probe = weak.upgrade().ok_or(ProbeError::Dropped)?;
                tokio::time::timeout(timeout, probe.check_health())
                    .await
                    .unwrap_or(Err(ProbeError::Timeout(timeout)))
            }
            ProbeHandle::Field(receiver) => {
                if receiver.has_changed().is_err() {
                    return Err(ProbeError::Dropped);
                }
                let value = receiver.borrow().clone();
                Ok(value)
            }
            ProbeHandle::Passive => Ok(Value::String("healthy".to_string())),
        }
    }
}

impl fmt::Debug for ProbeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProbeHandle").field(&self.kind()).finish()
    }
}

/// A collaborator that advertises one or more probes for discovery.
///
/// Implemented by containers of feature modules so they can be registered
/// in bulk with [`HealthEngine::discover`](crate::HealthEngine::discover).
pub trait HealthSource {
    fn health_probes(&self) -> Vec<(String, ProbeHandle)>;
}
