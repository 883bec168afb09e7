use std::{collections::BTreeSet, ops::RangeInclusive, path::Path};

use crate::{
    core::{Cell, CellConfig, Chemistry, CoreError, Thresholds},
    prelude::*,
    quantity::{capacity::AmpHours, current::Amps, temperature::Celsius, voltage::Volts},
};

/// Bench setup loaded from a TOML file: identification plus one entry per
/// cell. Everything beyond the chemistry is optional and falls back to the
/// chemistry defaults.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct FleetConfig {
    pub bench_name: String,

    #[serde(default = "default_group_number")]
    pub group_number: u32,

    #[serde(rename = "cell")]
    pub cells: Vec<CellEntry>,
}

const fn default_group_number() -> u32 {
    1
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct CellEntry {
    pub id: String,
    pub chemistry: Chemistry,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_voltage: Option<Volts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rated_capacity: Option<AmpHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_charge_current: Option<Amps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discharge_current: Option<Amps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_safe_range: Option<RangeInclusive<Celsius>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
}

impl CellEntry {
    /// Chemistry defaults with this entry's overrides applied, validated
    /// before any cell is built from it.
    pub fn to_config(&self) -> Result<CellConfig, CoreError> {
        let mut config = CellConfig::for_chemistry(self.chemistry);
        if let Some(nominal_voltage) = self.nominal_voltage {
            config.nominal_voltage = nominal_voltage;
        }
        if let Some(rated_capacity) = self.rated_capacity {
            config.rated_capacity = rated_capacity;
        }
        if let Some(max_charge_current) = self.max_charge_current {
            config.max_charge_current = max_charge_current;
        }
        if let Some(max_discharge_current) = self.max_discharge_current {
            config.max_discharge_current = max_discharge_current;
        }
        if let Some(temp_safe_range) = self.temp_safe_range.clone() {
            config.temp_safe_range = temp_safe_range;
        }
        if let Some(thresholds) = self.thresholds {
            config.thresholds = thresholds;
        }
        config.validate()?;
        Ok(config)
    }
}

impl FleetConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read the fleet config from `{}`", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse the fleet config `{}`", path.display()))?;
        info!(
            bench_name = %config.bench_name,
            n_cells = config.cells.len(),
            "loaded the fleet config",
        );
        Ok(config)
    }

    /// Validates every entry and rejects duplicate ids before any cell is
    /// built.
    pub fn build_cells(&self) -> Result<Vec<Cell>, CoreError> {
        if self.cells.is_empty() {
            return Err(CoreError::InvalidConfig {
                reason: "the fleet config declares no cells".to_string(),
            });
        }
        let mut seen = BTreeSet::new();
        for entry in &self.cells {
            if !seen.insert(entry.id.as_str()) {
                return Err(CoreError::InvalidConfig {
                    reason: format!("duplicate cell id `{}`", entry.id),
                });
            }
        }
        self.cells
            .iter()
            .map(|entry| Cell::new(entry.id.clone(), entry.to_config()?))
            .collect()
    }
}
