//! REST API for the system monitor
//!
//! This module provides HTTP endpoints for live and historical metrics,
//! alert listing and acknowledgment, and CSV export.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **MonitorService** for every read and for on-demand collection
//! - **Scheduler** for reporting whether the periodic loop is running
//!
//! ## Endpoints
//!
//! - `GET /` - Endpoint index
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/stats` - Storage and scheduler statistics
//! - `GET /api/v1/metrics` - Live sample (not persisted)
//! - `GET /api/v1/metrics/{cpu,memory,disk,battery,network}` - One section of a live sample
//! - `POST /api/v1/metrics/snapshot` - Collect, persist and evaluate now
//! - `GET /api/v1/metrics/history?hours=1` - Stored snapshots
//! - `GET /api/v1/alerts` - Unacknowledged alerts
//! - `GET /api/v1/alerts/history?hours=24` - Recent alerts
//! - `POST /api/v1/alerts/:id/acknowledge` - Acknowledge an alert
//! - `GET /api/v1/alerts/thresholds` - Threshold table
//! - `GET /api/v1/export/csv?hours=24` - Snapshot history as CSV

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{
    AcknowledgeResponse, AlertHistoryResponse, AlertsResponse, HealthResponse, HoursQuery,
    SnapshotHistoryResponse,
};

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
#[cfg(feature = "api")]
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind_addr: SocketAddr,

    /// Enable permissive CORS for browser dashboards
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], crate::util::DEFAULT_PORT)),
            enable_cors: true,
        }
    }
}

impl From<&crate::config::ApiConfig> for ApiServerConfig {
    fn from(config: &crate::config::ApiConfig) -> Self {
        Self {
            bind_addr: crate::util::resolve_bind(config.bind),
            enable_cors: config.enable_cors,
        }
    }
}

/// Build the router with all routes
#[cfg(feature = "api")]
pub fn router(state: ApiState) -> Router {
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/", get(routes::index::index))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/metrics", get(routes::metrics::current_metrics))
        .route("/api/v1/metrics/cpu", get(routes::metrics::cpu_metrics))
        .route("/api/v1/metrics/memory", get(routes::metrics::memory_metrics))
        .route("/api/v1/metrics/disk", get(routes::metrics::disk_metrics))
        .route(
            "/api/v1/metrics/battery",
            get(routes::metrics::battery_metrics),
        )
        .route(
            "/api/v1/metrics/network",
            get(routes::metrics::network_metrics),
        )
        .route(
            "/api/v1/metrics/snapshot",
            post(routes::metrics::take_snapshot),
        )
        .route(
            "/api/v1/metrics/history",
            get(routes::metrics::snapshot_history),
        )
        .route("/api/v1/alerts", get(routes::alerts::active_alerts))
        .route("/api/v1/alerts/history", get(routes::alerts::alert_history))
        .route(
            "/api/v1/alerts/thresholds",
            get(routes::alerts::thresholds),
        )
        .route(
            "/api/v1/alerts/:id/acknowledge",
            post(routes::alerts::acknowledge),
        )
        .route("/api/v1/export/csv", get(routes::export::export_csv))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(
    config: ApiServerConfig,
    state: ApiState,
) -> anyhow::Result<SocketAddr> {
    use tower_http::cors::{Any, CorsLayer};

    info!("starting API server on {}", config.bind_addr);

    let mut app = router(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
