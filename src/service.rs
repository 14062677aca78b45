//! The sampling and alerting pipeline behind the scheduler and the API
//!
//! Every caller that mutates alerts goes through `MonitorService`, which
//! serializes pipeline runs so the engine's find-then-create sequence can
//! never interleave with another run.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::MetricsRecord;
use crate::alerts::{AlertEngine, AlertOutcome, KindEvaluation};
use crate::error::{MonitorError, MonitorResult};
use crate::sampler::Sampler;
use crate::storage::{AlertId, AlertRecord, SnapshotId, SnapshotRecord, StorageBackend};
use crate::thresholds::ThresholdTable;

/// Result of one full pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub snapshot_id: SnapshotId,
    pub record: MetricsRecord,
    pub outcomes: Vec<KindEvaluation>,
}

impl CollectionReport {
    /// Alerts inserted by this run
    pub fn created(&self) -> impl Iterator<Item = &AlertRecord> {
        self.outcomes.iter().filter_map(|e| match &e.outcome {
            AlertOutcome::Created(alert) => Some(alert),
            _ => None,
        })
    }

    pub fn created_count(&self) -> usize {
        self.created().count()
    }
}

/// Default bound on a single `Sampler::sample` call
pub const DEFAULT_SAMPLER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub struct MonitorService {
    engine: AlertEngine,
    store: Arc<dyn StorageBackend>,
    sampler: Arc<dyn Sampler>,
    sampler_timeout: std::time::Duration,
    pipeline: Mutex<()>,
}

impl MonitorService {
    pub fn new(
        thresholds: Arc<ThresholdTable>,
        store: Arc<dyn StorageBackend>,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        Self {
            engine: AlertEngine::new(thresholds),
            store,
            sampler,
            sampler_timeout: DEFAULT_SAMPLER_TIMEOUT,
            pipeline: Mutex::new(()),
        }
    }

    pub fn with_sampler_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.sampler_timeout = timeout;
        self
    }

    /// Sample within the configured bound
    async fn sample(&self) -> MonitorResult<MetricsRecord> {
        tokio::time::timeout(self.sampler_timeout, self.sampler.sample())
            .await
            .map_err(|_| MonitorError::SamplerTimeout(self.sampler_timeout))?
    }

    pub fn store(&self) -> &Arc<dyn StorageBackend> {
        &self.store
    }

    /// Persist `record` as a snapshot, then evaluate it
    ///
    /// Runs are serialized: a second caller waits until the first one has
    /// finished both the snapshot write and the whole evaluation.
    #[instrument(skip_all, fields(timestamp = %record.timestamp))]
    pub async fn evaluate_and_persist(
        &self,
        record: &MetricsRecord,
    ) -> MonitorResult<(SnapshotId, Vec<KindEvaluation>)> {
        let _guard = self.pipeline.lock().await;

        let snapshot_id = self.store.save_snapshot(record).await?;
        debug!("saved snapshot {}", snapshot_id);

        let outcomes = self.engine.evaluate(record, self.store.as_ref()).await?;
        Ok((snapshot_id, outcomes))
    }

    /// Sample the host and run the pipeline on the result
    #[instrument(skip(self))]
    pub async fn collect(&self) -> MonitorResult<CollectionReport> {
        let record = self.sample().await?;
        let (snapshot_id, outcomes) = self.evaluate_and_persist(&record).await?;

        Ok(CollectionReport {
            snapshot_id,
            record,
            outcomes,
        })
    }

    /// A live sample that is neither stored nor evaluated
    pub async fn current_metrics(&self) -> MonitorResult<MetricsRecord> {
        self.sample().await
    }

    pub async fn get_active_alerts(&self) -> MonitorResult<Vec<AlertRecord>> {
        Ok(self.store.list_unacknowledged_alerts().await?)
    }

    /// `false` if no alert with that id exists
    #[instrument(skip(self))]
    pub async fn acknowledge(&self, id: AlertId) -> MonitorResult<bool> {
        Ok(self.store.acknowledge_alert(id).await?)
    }

    pub fn get_thresholds(&self) -> &ThresholdTable {
        self.engine.thresholds()
    }

    /// Alerts created or refreshed within the last `hours`, newest first
    pub async fn alert_history(&self, hours: u32) -> MonitorResult<Vec<AlertRecord>> {
        Ok(self.store.list_alerts_since(hours_ago(hours)?).await?)
    }

    /// Snapshots from the last `hours`, oldest first
    pub async fn snapshot_history(&self, hours: u32) -> MonitorResult<Vec<SnapshotRecord>> {
        Ok(self.store.list_snapshots_since(hours_ago(hours)?).await?)
    }

    /// Delete snapshots older than `retention_days`
    #[instrument(skip(self))]
    pub async fn cleanup_snapshots(&self, retention_days: u32) -> MonitorResult<usize> {
        let before = TimeDelta::try_days(i64::from(retention_days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| MonitorError::WindowOutOfRange(format!("{retention_days} days")))?;
        Ok(self.store.cleanup_old_snapshots(before).await?)
    }
}

fn hours_ago(hours: u32) -> MonitorResult<DateTime<Utc>> {
    TimeDelta::try_hours(i64::from(hours))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| MonitorError::WindowOutOfRange(format!("{hours} hours")))
}
