//! Registration, alert and lifecycle behaviour of `HealthEngine`.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use vigil_core::{AlertLevel, CoreError, HealthStatus};
use vigil_events::HealthEvent;
use vigil_monitor::{Companions, HealthEngine, HealthSource, MonitorConfig, ProbeHandle};

use common::{drain, test_config, test_engine, FixedProbe};

// ---------------------------------------------------------------------------
// Test: registering a name twice fails and leaves one entry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let engine = test_engine();

    engine
        .register("doorbell", ProbeHandle::Passive)
        .await
        .expect("first registration");

    assert_matches!(
        engine.register("doorbell", ProbeHandle::Passive).await,
        Err(CoreError::DuplicateName(name)) if name == "doorbell"
    );
    assert_eq!(engine.entry_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: registration raises an INFO alert and publishes it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registration_raises_info_alert() {
    let engine = test_engine();
    let mut rx = engine.subscribe();

    engine
        .register("doorbell", ProbeHandle::Passive)
        .await
        .expect("registered");

    let alerts = engine.alerts(Some(AlertLevel::Info)).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "Registered doorbell");
    assert_eq!(alerts[0].subject, "doorbell");

    let events = drain(&mut rx);
    assert_matches!(
        events.as_slice(),
        [HealthEvent::AlertRaised { alert }] if alert.message == "Registered doorbell"
    );
}

// ---------------------------------------------------------------------------
// Test: unregister reports whether the entry existed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unregister_reports_existence() {
    let engine = test_engine();
    engine
        .register("doorbell", ProbeHandle::Passive)
        .await
        .expect("registered");

    assert!(engine.unregister("doorbell").await);
    assert!(!engine.unregister("doorbell").await);
    assert_eq!(engine.entry_count().await, 0);
    assert_matches!(
        engine.entry_health("doorbell").await,
        Err(CoreError::NotFound(_))
    );
}

// ---------------------------------------------------------------------------
// Test: discovery registers new probes and skips known names
// ---------------------------------------------------------------------------

struct Appliances;

impl HealthSource for Appliances {
    fn health_probes(&self) -> Vec<(String, ProbeHandle)> {
        vec![
            ("fridge".to_string(), ProbeHandle::Passive),
            ("oven".to_string(), ProbeHandle::Passive),
            ("washer".to_string(), ProbeHandle::Passive),
        ]
    }
}

#[tokio::test]
async fn discovery_skips_registered_names() {
    let engine = test_engine();
    engine
        .register("oven", ProbeHandle::Passive)
        .await
        .expect("registered");

    assert_eq!(engine.discover(&Appliances).await, 2);
    assert_eq!(engine.entry_count().await, 3);

    // A second pass finds nothing new.
    assert_eq!(engine.discover(&Appliances).await, 0);
}

// ---------------------------------------------------------------------------
// Test: identical alerts inside the dedup window are stored once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_alert_is_suppressed() {
    let engine = test_engine();

    let first = engine
        .add_alert(AlertLevel::Warning, "Disk nearly full", "nas")
        .await;
    let second = engine
        .add_alert(AlertLevel::Warning, "Disk nearly full", "nas")
        .await;

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(engine.alerts(None).await.len(), 1);

    // Different subject is a different alert.
    assert!(engine
        .add_alert(AlertLevel::Warning, "Disk nearly full", "backup")
        .await
        .is_some());
}

// ---------------------------------------------------------------------------
// Test: resolve_alert succeeds once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolve_alert_succeeds_once() {
    let engine = test_engine();
    let alert = engine
        .add_alert(AlertLevel::Critical, "Hub offline", "hub")
        .await
        .expect("stored");

    assert!(engine.resolve_alert(alert.id).await);
    assert!(!engine.resolve_alert(alert.id).await);
    assert!(!engine.resolve_alert(uuid::Uuid::new_v4()).await);

    let report = engine.performance_report().await;
    assert_eq!(report.alerts.total, 1);
    assert_eq!(report.alerts.unresolved, 0);
    assert_eq!(report.alerts.critical, 0);
}

// ---------------------------------------------------------------------------
// Test: alert log never grows past its capacity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alert_log_is_bounded() {
    let engine = HealthEngine::new(
        MonitorConfig {
            max_alerts: 3,
            ..test_config()
        },
        Companions::default(),
    );

    for i in 0..5 {
        engine
            .add_alert(AlertLevel::Info, format!("notice {i}"), "hub")
            .await;
    }

    let alerts = engine.alerts(None).await;
    let messages: Vec<_> = alerts.iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, ["notice 4", "notice 3", "notice 2"]);
}

// ---------------------------------------------------------------------------
// Test: snapshot history keeps only the newest entries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_history_is_bounded() {
    let engine = HealthEngine::new(
        MonitorConfig {
            max_snapshots: 3,
            ..test_config()
        },
        Companions::default(),
    );
    engine
        .register("hub", ProbeHandle::Passive)
        .await
        .expect("registered");

    for _ in 0..5 {
        assert!(engine.record_snapshot().await.is_some());
    }

    assert_eq!(engine.dashboard().await.snapshot_count, 3);
    let history = engine.history(1).await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].scores.get("hub"), Some(&100));
}

// ---------------------------------------------------------------------------
// Test: destroy stops all mutation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn destroy_freezes_state() {
    let engine = test_engine();
    let probe = FixedProbe::new(json!("healthy"));
    engine
        .register("hub", ProbeHandle::probe(&probe))
        .await
        .expect("registered");
    engine.start().await;

    engine.destroy().await;
    assert!(engine.is_destroyed());

    let alerts_before = engine.alerts(None).await.len();
    let snapshots_before = engine.dashboard().await.snapshot_count;

    assert_matches!(
        engine.register("lamp", ProbeHandle::Passive).await,
        Err(CoreError::ShutDown)
    );
    assert!(!engine.unregister("hub").await);
    assert_matches!(engine.poll_all().await, Err(CoreError::ShutDown));
    assert_matches!(engine.check_entry("hub").await, Err(CoreError::ShutDown));
    assert_matches!(engine.run_diagnostics().await, Err(CoreError::ShutDown));
    assert!(engine
        .add_alert(AlertLevel::Critical, "late", "hub")
        .await
        .is_none());
    assert!(engine.record_snapshot().await.is_none());

    assert_eq!(engine.alerts(None).await.len(), alerts_before);
    assert_eq!(engine.dashboard().await.snapshot_count, snapshots_before);
    assert_eq!(engine.entry_count().await, 1);

    // Destroying twice is harmless.
    engine.destroy().await;
}

// ---------------------------------------------------------------------------
// Test: started engine polls on its own
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn started_engine_polls_in_background() {
    let engine = HealthEngine::new(
        MonitorConfig {
            poll_interval: Duration::from_secs(30),
            ..test_config()
        },
        Companions::default(),
    );
    let probe = FixedProbe::new(json!("degraded"));
    engine
        .register("hub", ProbeHandle::probe(&probe))
        .await
        .expect("registered");

    engine.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let health = engine.entry_health("hub").await.expect("entry exists");
    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(engine.dashboard().await.last_poll_at.is_some());

    engine.destroy().await;
}
