//! Helper types and functions for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use system_monitor::{
    BatteryMetrics, MetricsRecord,
    error::{MonitorError, MonitorResult},
    sampler::Sampler,
    service::MonitorService,
    storage::{
        AlertId, AlertRecord, HealthStatus, MemoryBackend, NewAlert, SnapshotId, SnapshotRecord,
        StorageBackend, StorageError, StorageResult,
    },
    thresholds::{MetricKind, Severity, ThresholdTable},
};

/// Record with the given usage and no battery, stamped now
pub fn sample(cpu: f64, memory: f64, disk: f64) -> MetricsRecord {
    MetricsRecord::with_usage(Utc::now(), cpu, memory, disk, None)
}

/// Record with an unplugged battery at `percent`
pub fn sample_on_battery(percent: f64) -> MetricsRecord {
    MetricsRecord::with_usage(
        Utc::now(),
        10.0,
        10.0,
        10.0,
        Some(BatteryMetrics {
            percent,
            is_plugged: false,
            time_remaining_mins: Some(90),
        }),
    )
}

/// Sampler that replays a script of cpu values, then repeats the last one
///
/// Can be switched into failing or hanging mode.
#[derive(Default)]
pub struct ScriptedSampler {
    script: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
    pub calls: AtomicUsize,
    pub failing: AtomicBool,
    pub hanging: AtomicBool,
}

impl ScriptedSampler {
    pub fn new(cpu_values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: Mutex::new(cpu_values.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sampler for ScriptedSampler {
    async fn sample(&self) -> MonitorResult<MetricsRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MonitorError::SamplerUnavailable("sensor offline".to_string()));
        }

        let cpu = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            *last
        };
        Ok(sample(cpu, 10.0, 10.0))
    }
}

/// Memory store whose calls can be made to fail or to yield mid-call
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    pub fail_writes: AtomicBool,
    /// Sleep inside `find_unacknowledged_alert`, widening the
    /// find-then-create window for race tests
    pub find_delay: Mutex<Option<Duration>>,
    pub snapshot_writes: AtomicUsize,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_writes(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::ConnectionFailed("database is locked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FlakyBackend {
    async fn save_snapshot(&self, metrics: &MetricsRecord) -> StorageResult<SnapshotId> {
        self.check_writes()?;
        self.snapshot_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_snapshot(metrics).await
    }

    async fn list_snapshots_since(
        &self,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<SnapshotRecord>> {
        self.inner.list_snapshots_since(since).await
    }

    async fn find_unacknowledged_alert(
        &self,
        kind: MetricKind,
        severity: Severity,
    ) -> StorageResult<Option<AlertRecord>> {
        let found = self.inner.find_unacknowledged_alert(kind, severity).await;
        let delay = *self.find_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        found
    }

    async fn create_alert(&self, alert: &NewAlert) -> StorageResult<AlertId> {
        self.check_writes()?;
        self.inner.create_alert(alert).await
    }

    async fn update_alert(
        &self,
        id: AlertId,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.check_writes()?;
        self.inner.update_alert(id, value, timestamp).await
    }

    async fn acknowledge_alert(&self, id: AlertId) -> StorageResult<bool> {
        self.inner.acknowledge_alert(id).await
    }

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<AlertRecord>> {
        self.inner.get_alert(id).await
    }

    async fn list_unacknowledged_alerts(&self) -> StorageResult<Vec<AlertRecord>> {
        self.inner.list_unacknowledged_alerts().await
    }

    async fn list_alerts_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<AlertRecord>> {
        self.inner.list_alerts_since(since).await
    }

    async fn cleanup_old_snapshots(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        self.inner.cleanup_old_snapshots(before).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn get_stats(&self) -> StorageResult<String> {
        self.inner.get_stats().await
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

pub fn create_service(
    store: Arc<dyn StorageBackend>,
    sampler: Arc<dyn Sampler>,
) -> Arc<MonitorService> {
    Arc::new(MonitorService::new(
        Arc::new(ThresholdTable::default()),
        store,
        sampler,
    ))
}

pub fn memory_service(sampler: Arc<dyn Sampler>) -> Arc<MonitorService> {
    create_service(Arc::new(MemoryBackend::new()), sampler)
}
