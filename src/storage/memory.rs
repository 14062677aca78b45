//! In-memory storage backend (no persistence)
//!
//! Selected with `"backend": "none"` and used throughout the tests.
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Bounded snapshots**: only the most recent `MAX_SNAPSHOTS` are kept

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::MetricsRecord;
use crate::thresholds::{MetricKind, Severity};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{AlertId, AlertRecord, NewAlert, SnapshotId, SnapshotRecord};

/// Maximum snapshots to keep in memory
const MAX_SNAPSHOTS: usize = 10_000;

#[derive(Debug, Default)]
struct Inner {
    snapshots: VecDeque<SnapshotRecord>,
    alerts: BTreeMap<AlertId, AlertRecord>,
    next_snapshot_id: SnapshotId,
    next_alert_id: AlertId,
}

/// In-memory storage backend
///
/// Each call takes the lock for its own duration only.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

impl MemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

/// Most recent first, newest id breaking timestamp ties
fn newest_first(alerts: &mut [AlertRecord]) {
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn save_snapshot(&self, metrics: &MetricsRecord) -> StorageResult<SnapshotId> {
        let mut inner = self.inner.write().await;
        inner.next_snapshot_id += 1;
        let id = inner.next_snapshot_id;

        inner.snapshots.push_back(SnapshotRecord {
            id,
            metrics: metrics.clone(),
        });
        if inner.snapshots.len() > MAX_SNAPSHOTS {
            inner.snapshots.pop_front();
        }

        Ok(id)
    }

    async fn list_snapshots_since(
        &self,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<SnapshotRecord>> {
        let inner = self.inner.read().await;
        let mut snapshots: Vec<SnapshotRecord> = inner
            .snapshots
            .iter()
            .filter(|s| s.metrics.timestamp >= since)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| {
            a.metrics
                .timestamp
                .cmp(&b.metrics.timestamp)
                .then(a.id.cmp(&b.id))
        });
        Ok(snapshots)
    }

    async fn find_unacknowledged_alert(
        &self,
        kind: MetricKind,
        severity: Severity,
    ) -> StorageResult<Option<AlertRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .alerts
            .values()
            .find(|a| !a.acknowledged && a.metric_kind == kind && a.severity == severity)
            .cloned())
    }

    async fn create_alert(&self, alert: &NewAlert) -> StorageResult<AlertId> {
        let mut inner = self.inner.write().await;
        inner.next_alert_id += 1;
        let id = inner.next_alert_id;
        inner.alerts.insert(id, alert.clone().with_id(id));
        Ok(id)
    }

    async fn update_alert(
        &self,
        id: AlertId,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        let alert = inner
            .alerts
            .get_mut(&id)
            .filter(|alert| !alert.acknowledged)
            .ok_or(StorageError::AlertNotFound(id))?;
        alert.metric_value = value;
        alert.timestamp = timestamp;
        Ok(())
    }

    async fn acknowledge_alert(&self, id: AlertId) -> StorageResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.alerts.get_mut(&id) {
            Some(alert) => {
                alert.acknowledged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<AlertRecord>> {
        Ok(self.inner.read().await.alerts.get(&id).cloned())
    }

    async fn list_unacknowledged_alerts(&self) -> StorageResult<Vec<AlertRecord>> {
        let inner = self.inner.read().await;
        let mut alerts: Vec<AlertRecord> = inner
            .alerts
            .values()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect();
        newest_first(&mut alerts);
        Ok(alerts)
    }

    async fn list_alerts_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<AlertRecord>> {
        let inner = self.inner.read().await;
        let mut alerts: Vec<AlertRecord> = inner
            .alerts
            .values()
            .filter(|a| a.timestamp >= since)
            .cloned()
            .collect();
        newest_first(&mut alerts);
        Ok(alerts)
    }

    async fn cleanup_old_snapshots(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let mut inner = self.inner.write().await;
        let count_before = inner.snapshots.len();
        inner.snapshots.retain(|s| s.metrics.timestamp >= before);
        let deleted = count_before - inner.snapshots.len();
        debug!("removed {} in-memory snapshots older than {}", deleted, before);
        Ok(deleted)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let inner = self.inner.read().await;
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("snapshots".to_string(), inner.snapshots.len().to_string()),
                ("alerts".to_string(), inner.alerts.len().to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let inner = self.inner.read().await;
        Ok(format!(
            "In-Memory: {} snapshots, {} alerts",
            inner.snapshots.len(),
            inner.alerts.len()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
