//! Persistent row types
//!
//! ## Snapshots
//!
//! A snapshot is a `MetricsRecord` plus the id the store assigned to it.
//! The SQLite backend flattens it into typed columns (one per reading) so
//! history and CSV export can be served without JSON decoding.
//!
//! ## Alerts
//!
//! An alert is created the first time a (kind, severity) pair is crossed
//! while no unacknowledged alert for that pair exists. Later crossings only
//! refresh `metric_value` and `timestamp`. Acknowledging is the one terminal
//! transition; alerts are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MetricsRecord;
use crate::thresholds::{MetricKind, Severity};

/// Identifier assigned by the store to a snapshot
pub type SnapshotId = i64;

/// Identifier assigned by the store to an alert
pub type AlertId = i64;

/// A persisted sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: SnapshotId,

    #[serde(flatten)]
    pub metrics: MetricsRecord,
}

/// A persisted alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,

    /// Last time the alert was created or refreshed
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "metric_type")]
    pub metric_kind: MetricKind,

    pub metric_value: f64,

    /// Level that was crossed
    pub threshold_value: f64,

    pub severity: Severity,

    pub message: String,

    pub acknowledged: bool,
}

/// An alert that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub timestamp: DateTime<Utc>,
    pub metric_kind: MetricKind,
    pub metric_value: f64,
    pub threshold_value: f64,
    pub severity: Severity,
    pub message: String,
}

impl NewAlert {
    /// Attach the store-assigned id. New alerts always start unacknowledged.
    pub fn with_id(self, id: AlertId) -> AlertRecord {
        AlertRecord {
            id,
            timestamp: self.timestamp,
            metric_kind: self.metric_kind,
            metric_value: self.metric_value,
            threshold_value: self.threshold_value,
            severity: self.severity,
            message: self.message,
            acknowledged: false,
        }
    }
}
