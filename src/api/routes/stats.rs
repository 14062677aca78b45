//! System statistics endpoint

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /api/v1/stats
///
/// Returns storage statistics and whether the collection loop is running
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let store = state.service.store();
    let stats = store.get_stats().await?;
    let health = store.health_check().await?;
    let options = state.scheduler.options();

    Ok(Json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "storage": {
            "healthy": health.healthy,
            "message": health.message,
            "stats": stats,
        },
        "scheduler": {
            "running": state.scheduler.is_running().await,
            "interval_secs": options.interval.as_secs(),
        },
    })))
}
