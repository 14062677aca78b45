pub mod actors;
pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod sampler;
pub mod service;
pub mod storage;
pub mod thresholds;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample of the host, taken at `timestamp`.
///
/// Built fresh on every tick, handed to the store (which maps it into a
/// snapshot row) and to the alert engine, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    /// `None` on machines without a battery sensor
    pub battery: Option<BatteryMetrics>,
    pub network: NetworkMetrics,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub usage_percent: f64,
    pub core_count: Option<usize>,
    pub logical_count: usize,
    pub frequency_mhz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryMetrics {
    pub percent: f64,
    pub is_plugged: bool,
    pub time_remaining_mins: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub bytes_sent_mb: f64,
    pub bytes_recv_mb: f64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

impl MetricsRecord {
    /// Record with the given usage percentages and zeroed detail fields.
    ///
    /// Mostly useful for feeding synthetic samples into the pipeline.
    pub fn with_usage(
        timestamp: DateTime<Utc>,
        cpu_percent: f64,
        memory_percent: f64,
        disk_percent: f64,
        battery: Option<BatteryMetrics>,
    ) -> Self {
        Self {
            timestamp,
            cpu: CpuMetrics {
                usage_percent: cpu_percent,
                ..Default::default()
            },
            memory: MemoryMetrics {
                usage_percent: memory_percent,
                ..Default::default()
            },
            disk: DiskMetrics {
                usage_percent: disk_percent,
                ..Default::default()
            },
            battery,
            network: NetworkMetrics::default(),
        }
    }
}
