//! Alert endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{AcknowledgeResponse, AlertHistoryResponse, AlertsResponse, HoursQuery},
};
use crate::storage::AlertId;
use crate::thresholds::ThresholdTable;

/// GET /api/v1/alerts
///
/// Unacknowledged alerts, newest first
pub async fn active_alerts(State(state): State<ApiState>) -> ApiResult<Json<AlertsResponse>> {
    let alerts = state.service.get_active_alerts().await?;

    Ok(Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    }))
}

/// GET /api/v1/alerts/history?hours=24
pub async fn alert_history(
    State(state): State<ApiState>,
    Query(query): Query<HoursQuery>,
) -> ApiResult<Json<AlertHistoryResponse>> {
    let hours = query.resolve(24)?;
    let alerts = state.service.alert_history(hours).await?;

    Ok(Json(AlertHistoryResponse {
        hours,
        count: alerts.len(),
        alerts,
    }))
}

/// POST /api/v1/alerts/:id/acknowledge
pub async fn acknowledge(
    State(state): State<ApiState>,
    Path(id): Path<AlertId>,
) -> ApiResult<Json<AcknowledgeResponse>> {
    if !state.service.acknowledge(id).await? {
        return Err(ApiError::NotFound("Alert not found".to_string()));
    }

    Ok(Json(AcknowledgeResponse {
        message: "Alert acknowledged".to_string(),
        alert_id: id,
    }))
}

/// GET /api/v1/alerts/thresholds
pub async fn thresholds(State(state): State<ApiState>) -> Json<ThresholdTable> {
    Json(state.service.get_thresholds().clone())
}
