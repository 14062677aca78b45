use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::trace;

use crate::actors::{RetentionPolicy, SchedulerOptions};
use crate::error::MonitorResult;
use crate::thresholds::{MetricKind, ThresholdTable};

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,

        /// Retention period in days (snapshots older than this are deleted)
        #[serde(default = "default_retention_days")]
        retention_days: u32,

        /// How often the retention cleanup runs
        #[serde(default = "default_cleanup_interval_hours")]
        cleanup_interval_hours: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
            retention_days: default_retention_days(),
            cleanup_interval_hours: default_cleanup_interval_hours(),
        }
    }
}

/// Longest accepted pause between ticks (one day)
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Longest accepted snapshot retention (100 years)
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Longest accepted pause between cleanups (one year)
pub const MAX_CLEANUP_INTERVAL_HOURS: u64 = 8_760;

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./system_monitor.db")
}

fn default_retention_days() -> u32 {
    30
}

fn default_cleanup_interval_hours() -> u64 {
    24
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_sampler_timeout_secs")]
    pub sampler_timeout_secs: u64,

    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            sampler_timeout_secs: default_sampler_timeout_secs(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn sampler_timeout(&self) -> Duration {
        Duration::from_secs(self.sampler_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_sampler_timeout_secs() -> u64 {
    5
}

fn default_store_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], crate::util::DEFAULT_PORT))
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Storage configuration (defaults to SQLite)
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    /// Replaces the built-in threshold table when present
    pub thresholds: Option<ThresholdTable>,
}

impl Config {
    /// Threshold table to run with, validated against every metric kind
    pub fn threshold_table(&self) -> MonitorResult<ThresholdTable> {
        let table = self.thresholds.clone().unwrap_or_default();
        table.validate(&MetricKind::ALL)?;
        Ok(table)
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        let retention = match &self.storage {
            StorageConfig::None => None,
            StorageConfig::Sqlite {
                retention_days,
                cleanup_interval_hours,
                ..
            } => Some(RetentionPolicy {
                retention_days: *retention_days,
                cleanup_interval: Duration::from_secs(
                    cleanup_interval_hours.saturating_mul(60 * 60),
                ),
            }),
        };

        SchedulerOptions {
            interval: Duration::from_secs(self.scheduler.interval_secs),
            retention,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_INTERVAL_SECS).contains(&self.scheduler.interval_secs) {
            anyhow::bail!("scheduler.interval_secs must be between 1 and {MAX_INTERVAL_SECS}");
        }
        if self.scheduler.sampler_timeout_secs == 0 || self.scheduler.store_timeout_secs == 0 {
            anyhow::bail!("scheduler timeouts must be greater than zero");
        }
        if let StorageConfig::Sqlite {
            retention_days,
            cleanup_interval_hours,
            ..
        } = self.storage
        {
            if !(1..=MAX_CLEANUP_INTERVAL_HOURS).contains(&cleanup_interval_hours) {
                anyhow::bail!(
                    "storage.cleanup_interval_hours must be between 1 and {MAX_CLEANUP_INTERVAL_HOURS}"
                );
            }
            if retention_days > MAX_RETENTION_DAYS {
                anyhow::bail!("storage.retention_days must be at most {MAX_RETENTION_DAYS}");
            }
        }
        self.threshold_table()?;
        Ok(())
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    config.validate()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}
