//! End-to-end alert behaviour through `MonitorService`
//!
//! These tests verify that:
//! - Repeated crossings refresh one alert instead of piling up new ones
//! - Acknowledged alerts are never reused
//! - Escalation leaves the warning alert open next to the critical one
//! - Battery alerts follow lower-is-worse semantics

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use pretty_assertions::assert_eq;
use system_monitor::{
    alerts::AlertOutcome,
    storage::{MemoryBackend, StorageBackend},
    thresholds::{MetricKind, Severity},
};

use crate::helpers::*;

fn cpu_outcome(outcomes: &[system_monitor::alerts::KindEvaluation]) -> AlertOutcome {
    outcomes
        .iter()
        .find(|e| e.kind == MetricKind::Cpu)
        .map(|e| e.outcome.clone())
        .unwrap()
}

#[tokio::test]
async fn test_dedup_then_update() {
    let service = memory_service(Arc::new(ScriptedSampler::default()));

    let first = sample(90.0, 10.0, 10.0);
    let mut second = sample(92.0, 10.0, 10.0);
    second.timestamp = first.timestamp + Duration::seconds(30);

    let (_, outcomes) = service.evaluate_and_persist(&first).await.unwrap();
    let created = assert_matches!(cpu_outcome(&outcomes), AlertOutcome::Created(alert) => alert);

    let (_, outcomes) = service.evaluate_and_persist(&second).await.unwrap();
    assert_eq!(cpu_outcome(&outcomes), AlertOutcome::Updated(created.id));

    let active = service.get_active_alerts().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].metric_value, 92.0);
    assert_eq!(active[0].timestamp, second.timestamp);
    assert_eq!(active[0].severity, Severity::Critical);
}

#[tokio::test]
async fn test_acknowledge_then_cross_creates_new_alert() {
    let service = memory_service(Arc::new(ScriptedSampler::default()));

    let (_, outcomes) = service
        .evaluate_and_persist(&sample(10.0, 80.0, 10.0))
        .await
        .unwrap();
    let first = outcomes
        .iter()
        .find_map(|e| match &e.outcome {
            AlertOutcome::Created(alert) if e.kind == MetricKind::Memory => Some(alert.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(first.severity, Severity::Warning);

    assert!(service.acknowledge(first.id).await.unwrap());
    // acknowledging twice is harmless
    assert!(service.acknowledge(first.id).await.unwrap());

    let (_, outcomes) = service
        .evaluate_and_persist(&sample(10.0, 80.0, 10.0))
        .await
        .unwrap();
    let memory = outcomes
        .iter()
        .find(|e| e.kind == MetricKind::Memory)
        .unwrap();
    let second = assert_matches!(&memory.outcome, AlertOutcome::Created(alert) => alert);
    assert_ne!(second.id, first.id);

    let history = service.alert_history(1).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(service.get_active_alerts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cpu_escalation_sequence() {
    let store = Arc::new(MemoryBackend::new());
    let service = create_service(store.clone(), Arc::new(ScriptedSampler::default()));

    let mut outcomes = Vec::new();
    for cpu in [60.0, 75.0, 88.0, 88.0, 65.0] {
        let (_, evaluations) = service
            .evaluate_and_persist(&sample(cpu, 10.0, 10.0))
            .await
            .unwrap();
        outcomes.push(cpu_outcome(&evaluations));
    }

    assert_eq!(outcomes[0], AlertOutcome::NoChange);
    let warning = assert_matches!(&outcomes[1], AlertOutcome::Created(a) => a.clone());
    let critical = assert_matches!(&outcomes[2], AlertOutcome::Created(a) => a.clone());
    assert_eq!(outcomes[3], AlertOutcome::Updated(critical.id));
    assert_eq!(outcomes[4], AlertOutcome::NoChange);

    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(critical.severity, Severity::Critical);

    // the warning alert was never touched after creation
    let stored = store.get_alert(warning.id).await.unwrap().unwrap();
    assert_eq!(stored.metric_value, 75.0);
    assert!(!stored.acknowledged);

    let active = service.get_active_alerts().await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(service.snapshot_history(1).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_battery_levels() {
    let service = memory_service(Arc::new(ScriptedSampler::default()));

    let (_, outcomes) = service
        .evaluate_and_persist(&sample_on_battery(21.0))
        .await
        .unwrap();
    let battery = outcomes
        .iter()
        .find(|e| e.kind == MetricKind::Battery)
        .unwrap();
    assert_eq!(battery.outcome, AlertOutcome::NoChange);

    let (_, outcomes) = service
        .evaluate_and_persist(&sample_on_battery(20.0))
        .await
        .unwrap();
    let battery = outcomes
        .iter()
        .find(|e| e.kind == MetricKind::Battery)
        .unwrap();
    let alert = assert_matches!(&battery.outcome, AlertOutcome::Created(a) => a);
    assert_eq!(alert.severity, Severity::Warning);
    assert_eq!(
        alert.message,
        "⚠️ WARNING: Battery level is low at 20.0% (threshold: 20%)"
    );

    let (_, outcomes) = service
        .evaluate_and_persist(&sample_on_battery(10.0))
        .await
        .unwrap();
    let battery = outcomes
        .iter()
        .find(|e| e.kind == MetricKind::Battery)
        .unwrap();
    let alert = assert_matches!(&battery.outcome, AlertOutcome::Created(a) => a);
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.threshold_value, 10.0);
}

#[tokio::test]
async fn test_plugged_in_battery_never_alerts() {
    let service = memory_service(Arc::new(ScriptedSampler::default()));

    let mut record = sample_on_battery(2.0);
    if let Some(battery) = record.battery.as_mut() {
        battery.is_plugged = true;
    }

    let (_, outcomes) = service.evaluate_and_persist(&record).await.unwrap();
    assert!(outcomes.iter().all(|e| e.kind != MetricKind::Battery));
    assert!(service.get_active_alerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_active_alert_round_trip() {
    let service = memory_service(Arc::new(ScriptedSampler::default()));

    service
        .evaluate_and_persist(&sample(10.0, 10.0, 96.5))
        .await
        .unwrap();

    let active = service.get_active_alerts().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].metric_kind, MetricKind::Disk);
    assert_eq!(active[0].metric_value, 96.5);
    assert_eq!(active[0].threshold_value, 95.0);
    assert_eq!(active[0].severity, Severity::Critical);
    assert_eq!(
        active[0].message,
        "🔴 CRITICAL: Disk usage is high at 96.5% (threshold: 95%)"
    );
}
