//! Integration tests for storage persistence
//!
//! These tests verify that:
//! - Snapshots and alerts survive reopening the database
//! - Dedup keeps working against the SQLite backend
//! - Retention cleanup removes old snapshots but keeps alerts

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use system_monitor::{
    alerts::AlertOutcome,
    storage::{StorageBackend, sqlite::SqliteBackend},
    thresholds::{MetricKind, Severity},
};
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_alerts_survive_restart() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("monitor.db");

    let alert_id = {
        let store = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let service = create_service(store.clone(), Arc::new(ScriptedSampler::new([91.0])));

        let report = service.collect().await.unwrap();
        let id = report.created().next().unwrap().id;
        store.close().await.unwrap();
        id
    };

    let store = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let service = create_service(store.clone(), Arc::new(ScriptedSampler::new([93.0])));

    // the reopened store still knows about the open alert, so this updates it
    let report = service.collect().await.unwrap();
    let cpu = report
        .outcomes
        .iter()
        .find(|e| e.kind == MetricKind::Cpu)
        .unwrap();
    assert_eq!(cpu.outcome, AlertOutcome::Updated(alert_id));

    let active = service.get_active_alerts().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, alert_id);
    assert_eq!(active[0].metric_value, 93.0);
    assert_eq!(active[0].severity, Severity::Critical);

    assert_eq!(service.snapshot_history(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_acknowledge_persists() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("monitor.db");

    let store = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let service = create_service(store.clone(), Arc::new(ScriptedSampler::default()));

    let (_, outcomes) = service
        .evaluate_and_persist(&sample(10.0, 10.0, 85.0))
        .await
        .unwrap();
    let id = outcomes
        .iter()
        .find_map(|e| match &e.outcome {
            AlertOutcome::Created(alert) => Some(alert.id),
            _ => None,
        })
        .unwrap();

    assert!(service.acknowledge(id).await.unwrap());
    assert!(!service.acknowledge(id + 1).await.unwrap());
    store.close().await.unwrap();

    let reopened = SqliteBackend::new(&db_path).await.unwrap();
    assert!(reopened.list_unacknowledged_alerts().await.unwrap().is_empty());
    let alert = reopened.get_alert(id).await.unwrap().unwrap();
    assert!(alert.acknowledged);
    assert_eq!(alert.metric_kind, MetricKind::Disk);
}

#[tokio::test]
async fn test_retention_cleanup() {
    let temp_dir = tempdir().unwrap();
    let store = Arc::new(SqliteBackend::new(temp_dir.path().join("m.db")).await.unwrap());
    let service = create_service(store.clone(), Arc::new(ScriptedSampler::default()));

    let mut old = sample(96.0, 10.0, 10.0);
    old.timestamp = Utc::now() - Duration::days(40);
    service.evaluate_and_persist(&old).await.unwrap();
    service
        .evaluate_and_persist(&sample(10.0, 10.0, 10.0))
        .await
        .unwrap();

    let deleted = service.cleanup_snapshots(30).await.unwrap();
    assert_eq!(deleted, 1);

    let remaining = store
        .list_snapshots_since(Utc::now() - Duration::days(365))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    // alerts are never deleted
    assert_eq!(service.get_active_alerts().await.unwrap().len(), 1);
}
