//! Live and historical metrics endpoints

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    BatteryMetrics, CpuMetrics, DiskMetrics, MemoryMetrics, MetricsRecord, NetworkMetrics,
};
use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{HoursQuery, SnapshotHistoryResponse},
};
use crate::service::CollectionReport;

/// GET /api/v1/metrics
///
/// Samples the host without storing or evaluating the result
pub async fn current_metrics(State(state): State<ApiState>) -> ApiResult<Json<MetricsRecord>> {
    Ok(Json(state.service.current_metrics().await?))
}

/// GET /api/v1/metrics/cpu
pub async fn cpu_metrics(State(state): State<ApiState>) -> ApiResult<Json<CpuMetrics>> {
    Ok(Json(state.service.current_metrics().await?.cpu))
}

/// GET /api/v1/metrics/memory
pub async fn memory_metrics(State(state): State<ApiState>) -> ApiResult<Json<MemoryMetrics>> {
    Ok(Json(state.service.current_metrics().await?.memory))
}

/// GET /api/v1/metrics/disk
pub async fn disk_metrics(State(state): State<ApiState>) -> ApiResult<Json<DiskMetrics>> {
    Ok(Json(state.service.current_metrics().await?.disk))
}

/// GET /api/v1/metrics/battery
///
/// `null` on machines without a battery
pub async fn battery_metrics(
    State(state): State<ApiState>,
) -> ApiResult<Json<Option<BatteryMetrics>>> {
    Ok(Json(state.service.current_metrics().await?.battery))
}

/// GET /api/v1/metrics/network
pub async fn network_metrics(State(state): State<ApiState>) -> ApiResult<Json<NetworkMetrics>> {
    Ok(Json(state.service.current_metrics().await?.network))
}

/// POST /api/v1/metrics/snapshot
///
/// Runs the same pipeline as a scheduled tick
pub async fn take_snapshot(State(state): State<ApiState>) -> ApiResult<Json<CollectionReport>> {
    Ok(Json(state.service.collect().await?))
}

/// GET /api/v1/metrics/history?hours=1
pub async fn snapshot_history(
    State(state): State<ApiState>,
    Query(query): Query<HoursQuery>,
) -> ApiResult<Json<SnapshotHistoryResponse>> {
    let hours = query.resolve(1)?;
    let snapshots = state.service.snapshot_history(hours).await?;

    Ok(Json(SnapshotHistoryResponse {
        hours,
        count: snapshots.len(),
        snapshots,
    }))
}
