//! Error types for the sampling and alerting pipeline

use std::fmt;
use std::time::Duration;

use crate::storage::StorageError;
use crate::thresholds::MetricKind;

/// Result type alias for pipeline operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that can occur while sampling, evaluating or persisting
#[derive(Debug)]
pub enum MonitorError {
    /// No threshold is configured for a metric kind the engine was asked about
    UnknownMetricKind(MetricKind),

    /// Threshold levels contradict their polarity
    InvalidThreshold { kind: MetricKind, reason: String },

    /// The OS could not be queried for metrics
    SamplerUnavailable(String),

    /// Sampling did not finish within the configured bound
    SamplerTimeout(Duration),

    /// Persistence failed (includes store timeouts)
    Storage(StorageError),

    /// A look-back window reaches outside the representable time range
    WindowOutOfRange(String),
}

impl MonitorError {
    /// Transient errors are contained in a tick and retried on the next one.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitorError::SamplerUnavailable(_)
                | MonitorError::SamplerTimeout(_)
                | MonitorError::Storage(_)
        )
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::UnknownMetricKind(kind) => {
                write!(f, "no threshold configured for metric kind '{}'", kind)
            }
            MonitorError::InvalidThreshold { kind, reason } => {
                write!(f, "invalid threshold for '{}': {}", kind, reason)
            }
            MonitorError::SamplerUnavailable(msg) => write!(f, "sampler unavailable: {}", msg),
            MonitorError::SamplerTimeout(after) => {
                write!(f, "sampler timed out after {:?}", after)
            }
            MonitorError::Storage(err) => write!(f, "store unavailable: {}", err),
            MonitorError::WindowOutOfRange(window) => {
                write!(f, "time window out of range: {}", window)
            }
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for MonitorError {
    fn from(err: StorageError) -> Self {
        MonitorError::Storage(err)
    }
}
