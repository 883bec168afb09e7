use chrono::{DateTime, Local};

use crate::core::{analytics::Metrics, cell::Cell, error::CoreError};

/// Alert priority, ordered lowest to highest.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overtemperature,
    VoltageOutOfRange,
    LowCapacity,
    LowEfficiency,
}

impl AlertKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overtemperature => "overtemperature",
            Self::VoltageOutOfRange => "voltage_out_of_range",
            Self::LowCapacity => "low_capacity",
            Self::LowEfficiency => "low_efficiency",
        }
    }
}

/// Stable identifier: one active alert per `(cell, kind)` key.
#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct AlertId(pub String);

impl AlertId {
    #[must_use]
    pub fn new(cell_id: &str, kind: AlertKind) -> Self {
        Self(format!("{cell_id}:{}", kind.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Alert {
    pub id: AlertId,
    pub severity: Severity,
    pub cell_id: String,
    pub kind: AlertKind,
    pub message: String,
    pub raised_at: DateTime<Local>,
}

/// Alerting thresholds, chemistry defaults overridable per cell.
#[derive(Copy, Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Thresholds {
    /// Warning below this fraction of the nominal voltage.
    pub low_voltage_ratio: f64,
    /// Warning above this fraction of the nominal voltage.
    pub high_voltage_ratio: f64,
    pub low_soc_warning: f64,
    pub low_soc_critical: f64,
    pub low_efficiency: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_voltage_ratio: 0.9,
            high_voltage_ratio: 1.1,
            low_soc_warning: 0.1,
            low_soc_critical: 0.03,
            low_efficiency: 0.7,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.low_voltage_ratio >= self.high_voltage_ratio {
            return Err(CoreError::InvalidConfig {
                reason: format!(
                    "low voltage ratio {} must be below high voltage ratio {}",
                    self.low_voltage_ratio, self.high_voltage_ratio,
                ),
            });
        }
        if self.low_soc_critical >= self.low_soc_warning {
            return Err(CoreError::InvalidConfig {
                reason: format!(
                    "critical SoC threshold {} must be below warning threshold {}",
                    self.low_soc_critical, self.low_soc_warning,
                ),
            });
        }
        Ok(())
    }
}

/// A low-efficiency episode only counts as sustained once this many
/// readings back it up.
const SUSTAINED_SAMPLES: usize = 10;

/// Stateless rule evaluator. Produces at most one alert per kind, so
/// repeated evaluation of unchanged state yields an identical set.
pub struct AlertEngine;

impl AlertEngine {
    #[must_use]
    pub fn evaluate(cell: &Cell, metrics: &Metrics) -> Vec<Alert> {
        let Some(reading) = cell.latest() else {
            return Vec::new();
        };
        let config = cell.config();
        let thresholds = &config.thresholds;
        let mut alerts = Vec::new();
        let mut raise = |severity: Severity, kind: AlertKind, message: String| {
            alerts.push(Alert {
                id: AlertId::new(cell.id(), kind),
                severity,
                cell_id: cell.id().to_owned(),
                kind,
                message,
                raised_at: reading.timestamp,
            });
        };

        if !config.temp_safe_range.contains(&reading.temperature) {
            raise(
                Severity::Critical,
                AlertKind::Overtemperature,
                format!(
                    "temperature {} outside safe range {:?}",
                    reading.temperature, config.temp_safe_range,
                ),
            );
        }

        let low_voltage = config.nominal_voltage * thresholds.low_voltage_ratio;
        let high_voltage = config.nominal_voltage * thresholds.high_voltage_ratio;
        if reading.voltage < low_voltage || reading.voltage > high_voltage {
            raise(
                Severity::Warning,
                AlertKind::VoltageOutOfRange,
                format!(
                    "voltage {} outside [{low_voltage}, {high_voltage}]",
                    reading.voltage,
                ),
            );
        }

        // The tighter SoC rule wins: one alert per kind, highest severity.
        if metrics.state_of_charge < thresholds.low_soc_critical {
            raise(
                Severity::Critical,
                AlertKind::LowCapacity,
                format!("state of charge {:.3} critically low", metrics.state_of_charge),
            );
        } else if metrics.state_of_charge < thresholds.low_soc_warning {
            raise(
                Severity::Warning,
                AlertKind::LowCapacity,
                format!("state of charge {:.3} low", metrics.state_of_charge),
            );
        }

        if metrics.efficiency < thresholds.low_efficiency
            && cell.history().len() >= SUSTAINED_SAMPLES
        {
            raise(
                Severity::Info,
                AlertKind::LowEfficiency,
                format!("round-trip efficiency {:.2} sustained below target", metrics.efficiency),
            );
        }

        alerts
    }
}
