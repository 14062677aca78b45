//! Host sampling
//!
//! `SystemSampler` reads CPU, memory, disk and network figures through
//! `sysinfo`. Battery state comes from the Linux power-supply class in
//! sysfs; other platforms report no battery.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sysinfo::{Disks, Networks, System};
use tracing::{debug, instrument, trace};

use crate::error::{MonitorError, MonitorResult};
use crate::{
    BatteryMetrics, CpuMetrics, DiskMetrics, MemoryMetrics, MetricsRecord, NetworkMetrics,
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Source of `MetricsRecord`s
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Take one sample of the host
    ///
    /// A missing battery is `battery: None`, never an error.
    async fn sample(&self) -> MonitorResult<MetricsRecord>;
}

/// Samples the machine this process runs on
///
/// The OS calls block for at least `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`,
/// so they run on the blocking pool.
#[derive(Debug, Clone)]
pub struct SystemSampler {
    power_supply_dir: PathBuf,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            power_supply_dir: PathBuf::from(POWER_SUPPLY_DIR),
        }
    }

    /// Read battery state from a different power-supply directory
    pub fn with_power_supply_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.power_supply_dir = dir.into();
        self
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sampler for SystemSampler {
    #[instrument(skip(self))]
    async fn sample(&self) -> MonitorResult<MetricsRecord> {
        let power_supply_dir = self.power_supply_dir.clone();
        let record = tokio::task::spawn_blocking(move || sample_blocking(&power_supply_dir))
            .await
            .map_err(|e| MonitorError::SamplerUnavailable(e.to_string()))?;

        debug!(
            "sampled cpu {:.1}% memory {:.1}% disk {:.1}%",
            record.cpu.usage_percent, record.memory.usage_percent, record.disk.usage_percent
        );
        Ok(record)
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_percent(part as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sample_blocking(power_supply_dir: &Path) -> MetricsRecord {
    let mut sys = System::new();

    // usage is a delta between two refreshes
    sys.refresh_cpu_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_all();
    sys.refresh_memory();

    let cpus = sys.cpus();
    let cpu = CpuMetrics {
        usage_percent: clamp_percent(sys.global_cpu_usage() as f64),
        core_count: System::physical_core_count(),
        logical_count: cpus.len(),
        frequency_mhz: cpus.first().map(|cpu| cpu.frequency() as f64),
    };

    let total_memory = sys.total_memory();
    let used_memory = sys.used_memory();
    let memory = MemoryMetrics {
        total_gb: round2(total_memory as f64 / BYTES_PER_GB),
        used_gb: round2(used_memory as f64 / BYTES_PER_GB),
        available_gb: round2(sys.available_memory() as f64 / BYTES_PER_GB),
        usage_percent: percent_of(used_memory, total_memory),
    };

    let disk = sample_disk();
    let network = sample_network();
    let battery = read_battery(power_supply_dir);

    MetricsRecord {
        timestamp: Utc::now(),
        cpu,
        memory,
        disk,
        battery,
        network,
    }
}

/// Usage of the root filesystem, or of the largest disk if there is no `/`
fn sample_disk() -> DiskMetrics {
    let disks = Disks::new_with_refreshed_list();

    let disk = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().iter().max_by_key(|disk| disk.total_space()));

    let Some(disk) = disk else {
        trace!("no disks reported");
        return DiskMetrics::default();
    };

    let total = disk.total_space();
    let free = disk.available_space();
    let used = total.saturating_sub(free);

    DiskMetrics {
        total_gb: round2(total as f64 / BYTES_PER_GB),
        used_gb: round2(used as f64 / BYTES_PER_GB),
        free_gb: round2(free as f64 / BYTES_PER_GB),
        usage_percent: (percent_of(used, total) * 10.0).round() / 10.0,
    }
}

/// Totals across all interfaces since boot
fn sample_network() -> NetworkMetrics {
    let networks = Networks::new_with_refreshed_list();

    let mut sent = 0u64;
    let mut received = 0u64;
    let mut packets_sent = 0u64;
    let mut packets_recv = 0u64;

    for (_name, data) in &networks {
        sent = sent.saturating_add(data.total_transmitted());
        received = received.saturating_add(data.total_received());
        packets_sent = packets_sent.saturating_add(data.total_packets_transmitted());
        packets_recv = packets_recv.saturating_add(data.total_packets_received());
    }

    NetworkMetrics {
        bytes_sent_mb: round2(sent as f64 / BYTES_PER_MB),
        bytes_recv_mb: round2(received as f64 / BYTES_PER_MB),
        packets_sent,
        packets_recv,
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

fn read_number(path: &Path) -> Option<f64> {
    read_trimmed(path)?.parse().ok()
}

/// First battery under `dir`, if any
fn read_battery(dir: &Path) -> Option<BatteryMetrics> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut supplies: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    supplies.sort();

    let battery = supplies
        .iter()
        .find(|p| read_trimmed(&p.join("type")).as_deref() == Some("Battery"))?;

    let percent = clamp_percent(read_number(&battery.join("capacity"))?);

    let status = read_trimmed(&battery.join("status")).unwrap_or_default();
    let mains_online = supplies.iter().any(|p| {
        read_trimmed(&p.join("type")).as_deref() == Some("Mains")
            && read_trimmed(&p.join("online")).as_deref() == Some("1")
    });
    let is_plugged = mains_online || status != "Discharging";

    let time_remaining_mins = if is_plugged {
        None
    } else {
        time_remaining(battery)
    };

    Some(BatteryMetrics {
        percent,
        is_plugged,
        time_remaining_mins,
    })
}

/// Minutes left at the current drain rate
fn time_remaining(battery: &Path) -> Option<i64> {
    let (remaining, rate) = match (
        read_number(&battery.join("energy_now")),
        read_number(&battery.join("power_now")),
    ) {
        (Some(energy), Some(power)) => (energy, power),
        _ => (
            read_number(&battery.join("charge_now"))?,
            read_number(&battery.join("current_now"))?,
        ),
    };

    if rate <= 0.0 {
        return None;
    }
    Some((remaining / rate * 60.0).round() as i64)
}
