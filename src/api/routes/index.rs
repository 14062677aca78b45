//! API index

use axum::Json;
use serde_json::{Value, json};

/// GET /
///
/// Names the service and lists the main endpoints
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to System Monitor API",
        "endpoints": {
            "health": "/api/v1/health",
            "stats": "/api/v1/stats",
            "all_metrics": "/api/v1/metrics",
            "cpu": "/api/v1/metrics/cpu",
            "memory": "/api/v1/metrics/memory",
            "disk": "/api/v1/metrics/disk",
            "battery": "/api/v1/metrics/battery",
            "network": "/api/v1/metrics/network",
            "save_snapshot": "/api/v1/metrics/snapshot (POST)",
            "history": "/api/v1/metrics/history?hours=1",
            "alerts": "/api/v1/alerts",
            "alert_history": "/api/v1/alerts/history?hours=24",
            "acknowledge": "/api/v1/alerts/{id}/acknowledge (POST)",
            "thresholds": "/api/v1/alerts/thresholds",
            "export_csv": "/api/v1/export/csv?hours=24",
        }
    }))
}
