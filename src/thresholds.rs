//! Static threshold configuration
//!
//! Maps each metric kind to a warning and a critical level plus the
//! direction in which the metric gets worse. The table is built once at
//! startup (defaults or config file) and is read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Kind of metric an alert can be raised for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
    Battery,
}

impl MetricKind {
    /// All kinds, in evaluation order
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Disk,
        MetricKind::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
            MetricKind::Battery => "battery",
        }
    }

    /// Human readable name used in alert messages
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "CPU usage",
            MetricKind::Memory => "Memory usage",
            MetricKind::Disk => "Disk usage",
            MetricKind::Battery => "Battery level",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(MetricKind::Cpu),
            "memory" => Ok(MetricKind::Memory),
            "disk" => Ok(MetricKind::Disk),
            "battery" => Ok(MetricKind::Battery),
            other => Err(format!("unknown metric kind '{other}'")),
        }
    }
}

/// Alert severity, ordered `Warning < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Warning => "⚠️",
            Severity::Critical => "🔴",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Warning and critical levels for one metric kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
    pub higher_is_worse: bool,
}

impl Threshold {
    pub const fn new(warning: f64, critical: f64, higher_is_worse: bool) -> Self {
        Self {
            warning,
            critical,
            higher_is_worse,
        }
    }

    /// Severity crossed by `value` together with the level that was crossed.
    ///
    /// Critical is checked before warning, so a value satisfying both is
    /// reported as critical only.
    pub fn classify(&self, value: f64) -> Option<(Severity, f64)> {
        let crosses = |level: f64| {
            if self.higher_is_worse {
                value >= level
            } else {
                value <= level
            }
        };

        if crosses(self.critical) {
            Some((Severity::Critical, self.critical))
        } else if crosses(self.warning) {
            Some((Severity::Warning, self.warning))
        } else {
            None
        }
    }

    fn validate(&self, kind: MetricKind) -> MonitorResult<()> {
        if !self.warning.is_finite() || !self.critical.is_finite() {
            return Err(MonitorError::InvalidThreshold {
                kind,
                reason: "levels must be finite numbers".to_string(),
            });
        }

        let ordered = if self.higher_is_worse {
            self.warning <= self.critical
        } else {
            self.warning >= self.critical
        };

        if !ordered {
            return Err(MonitorError::InvalidThreshold {
                kind,
                reason: format!(
                    "warning {} and critical {} are out of order for {} polarity",
                    self.warning,
                    self.critical,
                    if self.higher_is_worse {
                        "higher-is-worse"
                    } else {
                        "lower-is-worse"
                    }
                ),
            });
        }

        Ok(())
    }
}

/// Process-wide threshold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    entries: BTreeMap<MetricKind, Threshold>,
}

impl ThresholdTable {
    /// Build a table from explicit entries (kinds may be missing)
    pub fn from_entries(entries: impl IntoIterator<Item = (MetricKind, Threshold)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, kind: MetricKind) -> MonitorResult<Threshold> {
        self.entries
            .get(&kind)
            .copied()
            .ok_or(MonitorError::UnknownMetricKind(kind))
    }

    /// Check that every kind in `required` is configured and that all
    /// configured levels are consistent with their polarity.
    pub fn validate(&self, required: &[MetricKind]) -> MonitorResult<()> {
        for kind in required {
            self.lookup(*kind)?;
        }

        for (kind, threshold) in &self.entries {
            threshold.validate(*kind)?;
        }

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, Threshold)> + '_ {
        self.entries.iter().map(|(kind, threshold)| (*kind, *threshold))
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::from_entries([
            (MetricKind::Cpu, Threshold::new(70.0, 85.0, true)),
            (MetricKind::Memory, Threshold::new(75.0, 90.0, true)),
            (MetricKind::Disk, Threshold::new(80.0, 95.0, true)),
            (MetricKind::Battery, Threshold::new(20.0, 10.0, false)),
        ])
    }
}
