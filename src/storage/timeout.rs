//! Per-call time bound for any backend

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::MetricsRecord;
use crate::thresholds::{MetricKind, Severity};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{AlertId, AlertRecord, NewAlert, SnapshotId, SnapshotRecord};

/// Wraps a backend and fails any call that runs longer than `timeout`
///
/// The inner future is dropped on expiry, which releases whatever pooled
/// connection or lock guard it was holding.
#[derive(Clone)]
pub struct TimeoutBackend {
    inner: Arc<dyn StorageBackend>,
    timeout: Duration,
}

impl TimeoutBackend {
    pub fn new(inner: Arc<dyn StorageBackend>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = StorageResult<T>> + Send,
    ) -> StorageResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("storage call '{}' timed out after {:?}", op, self.timeout);
                Err(StorageError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl StorageBackend for TimeoutBackend {
    async fn save_snapshot(&self, metrics: &MetricsRecord) -> StorageResult<SnapshotId> {
        self.bounded("save_snapshot", self.inner.save_snapshot(metrics))
            .await
    }

    async fn list_snapshots_since(
        &self,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<SnapshotRecord>> {
        self.bounded("list_snapshots_since", self.inner.list_snapshots_since(since))
            .await
    }

    async fn find_unacknowledged_alert(
        &self,
        kind: MetricKind,
        severity: Severity,
    ) -> StorageResult<Option<AlertRecord>> {
        self.bounded(
            "find_unacknowledged_alert",
            self.inner.find_unacknowledged_alert(kind, severity),
        )
        .await
    }

    async fn create_alert(&self, alert: &NewAlert) -> StorageResult<AlertId> {
        self.bounded("create_alert", self.inner.create_alert(alert))
            .await
    }

    async fn update_alert(
        &self,
        id: AlertId,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.bounded("update_alert", self.inner.update_alert(id, value, timestamp))
            .await
    }

    async fn acknowledge_alert(&self, id: AlertId) -> StorageResult<bool> {
        self.bounded("acknowledge_alert", self.inner.acknowledge_alert(id))
            .await
    }

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<AlertRecord>> {
        self.bounded("get_alert", self.inner.get_alert(id)).await
    }

    async fn list_unacknowledged_alerts(&self) -> StorageResult<Vec<AlertRecord>> {
        self.bounded(
            "list_unacknowledged_alerts",
            self.inner.list_unacknowledged_alerts(),
        )
        .await
    }

    async fn list_alerts_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<AlertRecord>> {
        self.bounded("list_alerts_since", self.inner.list_alerts_since(since))
            .await
    }

    async fn cleanup_old_snapshots(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        self.bounded(
            "cleanup_old_snapshots",
            self.inner.cleanup_old_snapshots(before),
        )
        .await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.bounded("health_check", self.inner.health_check()).await
    }

    async fn get_stats(&self) -> StorageResult<String> {
        self.bounded("get_stats", self.inner.get_stats()).await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}
