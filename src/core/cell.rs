use std::{collections::VecDeque, ops::RangeInclusive};

use crate::{
    core::{alert::Thresholds, chemistry::Chemistry, error::CoreError, reading::Reading},
    quantity::{capacity::AmpHours, current::Amps, temperature::Celsius, voltage::Volts},
};

pub type CellId = String;

/// Retained readings per cell, oldest dropped first.
pub const HISTORY_RETENTION: usize = 100;

/// Immutable description of a cell's chemistry and rated parameters.
/// Created once at setup time and owned by the [`Cell`].
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CellConfig {
    pub chemistry: Chemistry,
    pub nominal_voltage: Volts,
    pub rated_capacity: AmpHours,
    pub max_charge_current: Amps,
    pub max_discharge_current: Amps,
    pub temp_safe_range: RangeInclusive<Celsius>,
    pub thresholds: Thresholds,
}

impl CellConfig {
    /// Chemistry defaults: rated for a 100 Ah cell at ±10 A unless
    /// overridden at configuration time.
    #[must_use]
    pub fn for_chemistry(chemistry: Chemistry) -> Self {
        Self {
            chemistry,
            nominal_voltage: chemistry.nominal_voltage(),
            rated_capacity: AmpHours(100.0),
            max_charge_current: Amps(10.0),
            max_discharge_current: Amps(10.0),
            temp_safe_range: chemistry.default_temp_safe_range(),
            thresholds: Thresholds::default(),
        }
    }

    /// Rejects non-positive rated parameters and an empty safe range
    /// before any state is built from this configuration.
    pub fn validate(&self) -> Result<(), CoreError> {
        let check = |name: &str, value: f64| {
            if value > 0.0 {
                Ok(())
            } else {
                Err(CoreError::InvalidConfig {
                    reason: format!("{name} must be strictly positive, got {value}"),
                })
            }
        };
        check("nominal voltage", self.nominal_voltage.0)?;
        check("rated capacity", self.rated_capacity.0)?;
        check("max charge current", self.max_charge_current.0)?;
        check("max discharge current", self.max_discharge_current.0)?;
        if self.temp_safe_range.is_empty() {
            return Err(CoreError::InvalidConfig {
                reason: format!("empty temperature safe range {:?}", self.temp_safe_range),
            });
        }
        self.thresholds.validate()?;
        Ok(())
    }
}

/// A configured cell and its bounded telemetry history.
#[derive(Clone, Debug)]
pub struct Cell {
    id: CellId,
    config: CellConfig,
    history: VecDeque<Reading>,
}

impl Cell {
    pub fn new(id: impl Into<CellId>, config: CellConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            id: id.into(),
            config,
            history: VecDeque::with_capacity(HISTORY_RETENTION),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn config(&self) -> &CellConfig {
        &self.config
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.history.back()
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &Reading> {
        self.history.iter()
    }

    /// Commit point for a new reading: the invariant is enforced here, and
    /// the oldest reading is evicted once the retention window is full.
    pub fn record(&mut self, reading: Reading) -> Result<(), CoreError> {
        if reading.capacity_remaining < AmpHours::ZERO
            || reading.capacity_remaining > self.config.rated_capacity
        {
            return Err(CoreError::Generator {
                reason: format!(
                    "cell {}: capacity {} outside [0, {}]",
                    self.id, reading.capacity_remaining, self.config.rated_capacity,
                ),
            });
        }
        if self.history.len() == HISTORY_RETENTION {
            self.history.pop_front();
        }
        self.history.push_back(reading);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;

    fn reading(capacity_remaining: AmpHours) -> Reading {
        Reading {
            timestamp: Local::now(),
            voltage: Volts(3.2),
            current: Amps::ZERO,
            temperature: Celsius(25.0),
            capacity_remaining,
        }
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let mut config = CellConfig::for_chemistry(Chemistry::Lfp);
        config.rated_capacity = AmpHours(0.0);
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_capacity_above_rated() {
        let mut cell = Cell::new("cell-1", CellConfig::for_chemistry(Chemistry::Lfp)).unwrap();
        let result = cell.record(reading(AmpHours(100.5)));
        assert!(matches!(result, Err(CoreError::Generator { .. })));
        assert_eq!(cell.history().len(), 0);
    }

    #[test]
    fn evicts_oldest_reading_beyond_retention() {
        let mut cell = Cell::new("cell-1", CellConfig::for_chemistry(Chemistry::Lfp)).unwrap();
        for n in 0..=HISTORY_RETENTION {
            #[allow(clippy::cast_precision_loss)]
            cell.record(reading(AmpHours(n as f64 / 100.0))).unwrap();
        }
        assert_eq!(cell.history().len(), HISTORY_RETENTION);
        assert_eq!(cell.history().next().unwrap().capacity_remaining, AmpHours(0.01));
    }
}
