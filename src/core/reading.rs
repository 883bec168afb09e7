use chrono::{DateTime, Local};

use crate::quantity::{
    capacity::AmpHours,
    current::Amps,
    power::Watts,
    temperature::Celsius,
    voltage::Volts,
};

/// A single telemetry sample. Positive current is discharge, negative is
/// charge.
#[derive(Copy, Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub voltage: Volts,
    pub current: Amps,
    pub temperature: Celsius,
    pub capacity_remaining: AmpHours,
}

impl Reading {
    /// Instantaneous power at the terminals.
    #[must_use]
    pub fn power(&self) -> Watts {
        self.voltage * self.current
    }
}
