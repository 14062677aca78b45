//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for API reads during scheduler writes
//! - **Connection pooling**: every call checks a connection out of the pool
//!   and returns it when the call finishes, whatever the outcome
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Limitations
//!
//! - **Concurrency**: Limited concurrent writes
//! - **Distributed**: Single-machine only

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use crate::thresholds::{MetricKind, Severity};
use crate::{
    BatteryMetrics, CpuMetrics, DiskMetrics, MemoryMetrics, MetricsRecord, NetworkMetrics,
};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{AlertId, AlertRecord, NewAlert, SnapshotId, SnapshotRecord};

const ALERT_COLUMNS: &str = "id, timestamp, metric_type, metric_value, threshold_value, \
                             severity, message, acknowledged";

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for WAL mode
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use system_monitor::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./system_monitor.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> StorageResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| StorageError::CorruptRow(format!("timestamp {millis} out of range")))
    }

    fn alert_from_row(row: &SqliteRow) -> StorageResult<AlertRecord> {
        let kind: String = row.try_get("metric_type")?;
        let severity: String = row.try_get("severity")?;

        Ok(AlertRecord {
            id: row.try_get("id")?,
            timestamp: Self::millis_to_timestamp(row.try_get("timestamp")?)?,
            metric_kind: kind.parse().map_err(StorageError::CorruptRow)?,
            metric_value: row.try_get("metric_value")?,
            threshold_value: row.try_get("threshold_value")?,
            severity: severity.parse().map_err(StorageError::CorruptRow)?,
            message: row.try_get("message")?,
            acknowledged: row.try_get("acknowledged")?,
        })
    }

    fn snapshot_from_row(row: &SqliteRow) -> StorageResult<SnapshotRecord> {
        let battery_percent: Option<f64> = row.try_get("battery_percent")?;
        let battery_is_plugged: Option<bool> = row.try_get("battery_is_plugged")?;

        // battery columns are written together; a half-filled pair reads as absent
        let battery = match (battery_percent, battery_is_plugged) {
            (Some(percent), Some(is_plugged)) => Some(BatteryMetrics {
                percent,
                is_plugged,
                time_remaining_mins: row.try_get("battery_time_remaining_mins")?,
            }),
            _ => None,
        };

        Ok(SnapshotRecord {
            id: row.try_get("id")?,
            metrics: MetricsRecord {
                timestamp: Self::millis_to_timestamp(row.try_get("timestamp")?)?,
                cpu: CpuMetrics {
                    usage_percent: row.try_get("cpu_usage_percent")?,
                    core_count: row
                        .try_get::<Option<i64>, _>("cpu_core_count")?
                        .map(|v| v as usize),
                    logical_count: row.try_get::<i64, _>("cpu_logical_count")? as usize,
                    frequency_mhz: row.try_get("cpu_frequency_mhz")?,
                },
                memory: MemoryMetrics {
                    total_gb: row.try_get("memory_total_gb")?,
                    used_gb: row.try_get("memory_used_gb")?,
                    available_gb: row.try_get("memory_available_gb")?,
                    usage_percent: row.try_get("memory_usage_percent")?,
                },
                disk: DiskMetrics {
                    total_gb: row.try_get("disk_total_gb")?,
                    used_gb: row.try_get("disk_used_gb")?,
                    free_gb: row.try_get("disk_free_gb")?,
                    usage_percent: row.try_get("disk_usage_percent")?,
                },
                battery,
                network: NetworkMetrics {
                    bytes_sent_mb: row.try_get("network_bytes_sent_mb")?,
                    bytes_recv_mb: row.try_get("network_bytes_recv_mb")?,
                    packets_sent: row.try_get::<i64, _>("network_packets_sent")? as u64,
                    packets_recv: row.try_get::<i64, _>("network_packets_recv")? as u64,
                },
            },
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip_all, fields(timestamp = %metrics.timestamp))]
    async fn save_snapshot(&self, metrics: &MetricsRecord) -> StorageResult<SnapshotId> {
        let battery = metrics.battery.as_ref();

        let result = sqlx::query(
            r#"
            INSERT INTO metrics_snapshots (
                timestamp,
                cpu_usage_percent, cpu_core_count, cpu_logical_count, cpu_frequency_mhz,
                memory_total_gb, memory_used_gb, memory_available_gb, memory_usage_percent,
                disk_total_gb, disk_used_gb, disk_free_gb, disk_usage_percent,
                battery_percent, battery_is_plugged, battery_time_remaining_mins,
                network_bytes_sent_mb, network_bytes_recv_mb,
                network_packets_sent, network_packets_recv
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Self::timestamp_to_millis(&metrics.timestamp))
        .bind(metrics.cpu.usage_percent)
        .bind(metrics.cpu.core_count.map(|v| v as i64))
        .bind(metrics.cpu.logical_count as i64)
        .bind(metrics.cpu.frequency_mhz)
        .bind(metrics.memory.total_gb)
        .bind(metrics.memory.used_gb)
        .bind(metrics.memory.available_gb)
        .bind(metrics.memory.usage_percent)
        .bind(metrics.disk.total_gb)
        .bind(metrics.disk.used_gb)
        .bind(metrics.disk.free_gb)
        .bind(metrics.disk.usage_percent)
        .bind(battery.map(|b| b.percent))
        .bind(battery.map(|b| b.is_plugged))
        .bind(battery.and_then(|b| b.time_remaining_mins))
        .bind(metrics.network.bytes_sent_mb)
        .bind(metrics.network.bytes_recv_mb)
        .bind(metrics.network.packets_sent as i64)
        .bind(metrics.network.packets_recv as i64)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("saved snapshot {}", id);
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn list_snapshots_since(
        &self,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<SnapshotRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM metrics_snapshots WHERE timestamp >= ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(Self::timestamp_to_millis(&since))
        .fetch_all(&self.pool)
        .await?;

        let snapshots = rows
            .iter()
            .map(Self::snapshot_from_row)
            .collect::<StorageResult<Vec<_>>>()?;
        debug!("query returned {} snapshots", snapshots.len());
        Ok(snapshots)
    }

    #[instrument(skip(self))]
    async fn find_unacknowledged_alert(
        &self,
        kind: MetricKind,
        severity: Severity,
    ) -> StorageResult<Option<AlertRecord>> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts \
             WHERE metric_type = ? AND severity = ? AND acknowledged = 0 \
             ORDER BY id ASC LIMIT 1"
        );

        let row = sqlx::query(&sql)
            .bind(kind.as_str())
            .bind(severity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::alert_from_row).transpose()
    }

    #[instrument(skip_all, fields(kind = %alert.metric_kind, severity = %alert.severity))]
    async fn create_alert(&self, alert: &NewAlert) -> StorageResult<AlertId> {
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (
                timestamp, metric_type, metric_value, threshold_value,
                severity, message, acknowledged
            )
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(Self::timestamp_to_millis(&alert.timestamp))
        .bind(alert.metric_kind.as_str())
        .bind(alert.metric_value)
        .bind(alert.threshold_value)
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    #[instrument(skip(self))]
    async fn update_alert(
        &self,
        id: AlertId,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE alerts SET metric_value = ?, timestamp = ? WHERE id = ? AND acknowledged = 0",
        )
        .bind(value)
        .bind(Self::timestamp_to_millis(&timestamp))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AlertNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn acknowledge_alert(&self, id: AlertId) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE alerts SET acknowledged = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<AlertRecord>> {
        let sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::alert_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_unacknowledged_alerts(&self) -> StorageResult<Vec<AlertRecord>> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE acknowledged = 0 \
             ORDER BY timestamp DESC, id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(Self::alert_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_alerts_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<AlertRecord>> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE timestamp >= ? \
             ORDER BY timestamp DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(Self::timestamp_to_millis(&since))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::alert_from_row).collect()
    }

    #[instrument(skip(self), fields(before = %before))]
    async fn cleanup_old_snapshots(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        info!("cleaning up snapshots older than {}", before);

        let result = sqlx::query("DELETE FROM metrics_snapshots WHERE timestamp < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() as usize;
        info!("deleted {} old snapshots", deleted);

        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let (snapshots,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM metrics_snapshots")
            .fetch_one(&self.pool)
            .await?;

        let (alerts, open): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN acknowledged = 0 THEN 1 ELSE 0 END), 0) FROM alerts",
        )
        .fetch_one(&self.pool)
        .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(format!(
            "SQLite: {} snapshots, {} alerts ({} unacknowledged), {:.2} MB on disk",
            snapshots,
            alerts,
            open,
            file_size as f64 / 1_000_000.0
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
