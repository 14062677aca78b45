//! API request and response types

use serde::{Deserialize, Serialize};

use crate::storage::{AlertId, AlertRecord, SnapshotRecord};

use super::error::ApiError;

/// Longest window any history endpoint accepts (one week)
pub const MAX_HISTORY_HOURS: u32 = 168;

/// `?hours=N` on history and export endpoints
#[derive(Debug, Default, Deserialize)]
pub struct HoursQuery {
    pub hours: Option<u32>,
}

impl HoursQuery {
    /// The requested window, or `default` when absent; must be 1..=168
    pub fn resolve(&self, default: u32) -> Result<u32, ApiError> {
        let hours = self.hours.unwrap_or(default);
        if !(1..=MAX_HISTORY_HOURS).contains(&hours) {
            return Err(ApiError::InvalidRequest(format!(
                "hours must be between 1 and {MAX_HISTORY_HOURS}, got {hours}"
            )));
        }
        Ok(hours)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertHistoryResponse {
    pub hours: u32,
    pub alerts: Vec<AlertRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHistoryResponse {
    pub hours: u32,
    pub snapshots: Vec<SnapshotRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub message: String,
    pub alert_id: AlertId,
}
