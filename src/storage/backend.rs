//! Storage backend trait definition
//!
//! This module defines the `StorageBackend` trait that all storage
//! implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::MetricsRecord;
use crate::thresholds::{MetricKind, Severity};

use super::error::StorageResult;
use super::schema::{AlertId, AlertRecord, NewAlert, SnapshotId, SnapshotRecord};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for persistent storage backends
///
/// ## Scoping
///
/// Every call acquires whatever it needs (pooled connection, transaction,
/// lock guard) and releases it before returning, on success and on error.
/// Nothing is held between calls, so a failed call cannot poison the next
/// one.
///
/// ## Uniqueness
///
/// Backends do not enforce "one unacknowledged alert per (kind, severity)".
/// The pipeline serializes find-then-create itself.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the
/// scheduler task and API handlers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist a sample and return its id
    async fn save_snapshot(&self, metrics: &MetricsRecord) -> StorageResult<SnapshotId>;

    /// Snapshots taken at or after `since`, oldest first
    async fn list_snapshots_since(&self, since: DateTime<Utc>)
    -> StorageResult<Vec<SnapshotRecord>>;

    /// The unacknowledged alert for `(kind, severity)`, if any
    async fn find_unacknowledged_alert(
        &self,
        kind: MetricKind,
        severity: Severity,
    ) -> StorageResult<Option<AlertRecord>>;

    /// Insert an alert and return its id
    async fn create_alert(&self, alert: &NewAlert) -> StorageResult<AlertId>;

    /// Refresh the value and timestamp of an unacknowledged alert
    ///
    /// Acknowledged alerts are never modified. Fails with
    /// `StorageError::AlertNotFound` when no unacknowledged alert has that id.
    async fn update_alert(
        &self,
        id: AlertId,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Mark an alert as acknowledged
    ///
    /// Returns `false` if no alert with that id exists. Acknowledging an
    /// already acknowledged alert succeeds and changes nothing.
    async fn acknowledge_alert(&self, id: AlertId) -> StorageResult<bool>;

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<AlertRecord>>;

    /// All unacknowledged alerts, most recent first
    async fn list_unacknowledged_alerts(&self) -> StorageResult<Vec<AlertRecord>>;

    /// Alerts whose timestamp is at or after `since`, most recent first
    async fn list_alerts_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<AlertRecord>>;

    /// Delete snapshots older than `before`
    ///
    /// Used for retention policy enforcement. Alerts are never deleted.
    /// Returns the number of snapshots deleted.
    async fn cleanup_old_snapshots(&self, before: DateTime<Utc>) -> StorageResult<usize>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get backend-specific statistics
    ///
    /// Returns human-readable stats about the backend
    /// (e.g., "SQLite: 1200 snapshots, 4 alerts, 0.45 MB on disk").
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
