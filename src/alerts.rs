//! Threshold alerting
//!
//! `AlertEngine` classifies each reading of a sample and either refreshes
//! the open alert for that kind and severity or opens a new one.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use crate::MetricsRecord;
use crate::error::MonitorResult;
use crate::storage::{AlertId, AlertRecord, NewAlert, StorageBackend, StorageError};
use crate::thresholds::{MetricKind, Severity, ThresholdTable};

/// What evaluating one metric kind did to the alert set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "alert", rename_all = "snake_case")]
pub enum AlertOutcome {
    /// A new alert was inserted
    Created(AlertRecord),
    /// The open alert for the same (kind, severity) was refreshed
    Updated(AlertId),
    /// The value is inside its thresholds
    NoChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindEvaluation {
    pub kind: MetricKind,
    #[serde(flatten)]
    pub outcome: AlertOutcome,
}

/// Turns a sample into alert creations and refreshes
///
/// Holds no state between calls. Callers that may evaluate concurrently must
/// serialize calls themselves, since find-then-create is not atomic in the
/// store.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    thresholds: Arc<ThresholdTable>,
}

impl AlertEngine {
    pub fn new(thresholds: Arc<ThresholdTable>) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Evaluate every kind present in `record`, in the order cpu, memory,
    /// disk, battery.
    ///
    /// Battery is skipped entirely while it is absent or plugged in.
    #[instrument(skip_all, fields(timestamp = %record.timestamp))]
    pub async fn evaluate(
        &self,
        record: &MetricsRecord,
        store: &dyn StorageBackend,
    ) -> MonitorResult<Vec<KindEvaluation>> {
        let mut readings = vec![
            (MetricKind::Cpu, record.cpu.usage_percent),
            (MetricKind::Memory, record.memory.usage_percent),
            (MetricKind::Disk, record.disk.usage_percent),
        ];
        if let Some(battery) = record.battery.as_ref().filter(|b| !b.is_plugged) {
            readings.push((MetricKind::Battery, battery.percent));
        }

        let mut evaluations = Vec::with_capacity(readings.len());
        for (kind, value) in readings {
            let outcome = self.evaluate_kind(kind, value, record, store).await?;
            evaluations.push(KindEvaluation { kind, outcome });
        }

        Ok(evaluations)
    }

    async fn evaluate_kind(
        &self,
        kind: MetricKind,
        value: f64,
        record: &MetricsRecord,
        store: &dyn StorageBackend,
    ) -> MonitorResult<AlertOutcome> {
        let threshold = self.thresholds.lookup(kind)?;

        let Some((severity, level)) = threshold.classify(value) else {
            trace!("{} at {} is within thresholds", kind, value);
            return Ok(AlertOutcome::NoChange);
        };

        if let Some(existing) = store.find_unacknowledged_alert(kind, severity).await? {
            match store.update_alert(existing.id, value, record.timestamp).await {
                Ok(()) => {
                    trace!("refreshed {} alert {} for {}", severity, existing.id, kind);
                    return Ok(AlertOutcome::Updated(existing.id));
                }
                // acknowledged since the lookup
                Err(StorageError::AlertNotFound(_)) => {
                    debug!("{} alert {} closed before refresh", severity, existing.id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let alert = NewAlert {
            timestamp: record.timestamp,
            metric_kind: kind,
            metric_value: value,
            threshold_value: level,
            severity,
            message: format_alert_message(kind, severity, value, level),
        };
        let id = store.create_alert(&alert).await?;
        info!("ALERT: {}", alert.message);

        Ok(AlertOutcome::Created(alert.with_id(id)))
    }
}

/// `"🔴 CRITICAL: CPU usage is high at 88.0% (threshold: 85%)"`
///
/// The value always carries a fractional part; the threshold only when it
/// has one.
pub fn format_alert_message(kind: MetricKind, severity: Severity, value: f64, threshold: f64) -> String {
    let direction = match kind {
        MetricKind::Battery => "low",
        _ => "high",
    };

    format!(
        "{} {}: {} is {} at {:?}% (threshold: {}%)",
        severity.emoji(),
        severity.as_str().to_uppercase(),
        kind.display_name(),
        direction,
        value,
        threshold
    )
}
