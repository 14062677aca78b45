//! CSV export of stored snapshots

use std::fmt::Write;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use crate::api::{error::ApiResult, state::ApiState, types::HoursQuery};
use crate::storage::SnapshotRecord;

const CSV_HEADER: [&str; 17] = [
    "Timestamp",
    "CPU Usage %",
    "CPU Cores",
    "CPU Threads",
    "CPU Frequency MHz",
    "Memory Total GB",
    "Memory Used GB",
    "Memory Available GB",
    "Memory Usage %",
    "Disk Total GB",
    "Disk Used GB",
    "Disk Free GB",
    "Disk Usage %",
    "Battery %",
    "Battery Plugged",
    "Network Sent MB",
    "Network Received MB",
];

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render snapshots as CSV, one row per snapshot in the given order
pub fn render_csv(snapshots: &[SnapshotRecord]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for snapshot in snapshots {
        let m = &snapshot.metrics;
        let battery = m.battery.as_ref();

        let row = [
            m.timestamp.to_rfc3339(),
            m.cpu.usage_percent.to_string(),
            optional(m.cpu.core_count),
            m.cpu.logical_count.to_string(),
            optional(m.cpu.frequency_mhz),
            m.memory.total_gb.to_string(),
            m.memory.used_gb.to_string(),
            m.memory.available_gb.to_string(),
            m.memory.usage_percent.to_string(),
            m.disk.total_gb.to_string(),
            m.disk.used_gb.to_string(),
            m.disk.free_gb.to_string(),
            m.disk.usage_percent.to_string(),
            optional(battery.map(|b| b.percent)),
            optional(battery.map(|b| b.is_plugged)),
            m.network.bytes_sent_mb.to_string(),
            m.network.bytes_recv_mb.to_string(),
        ];

        // writing into a String cannot fail
        let _ = writeln!(out, "{}", row.join(","));
    }

    out
}

/// GET /api/v1/export/csv?hours=24
pub async fn export_csv(
    State(state): State<ApiState>,
    Query(query): Query<HoursQuery>,
) -> ApiResult<impl IntoResponse> {
    let hours = query.resolve(24)?;
    let snapshots = state.service.snapshot_history(hours).await?;

    let disposition = format!("attachment; filename=system_metrics_{hours}h.csv");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_csv(&snapshots),
    ))
}
