use chrono::{DateTime, Local, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    core::{
        cell::{Cell, CellConfig},
        error::CoreError,
        reading::Reading,
    },
    prelude::*,
    quantity::{capacity::AmpHours, current::Amps, temperature::Celsius, voltage::Volts},
};

/// Voltage never leaves this band around nominal, by construction.
const VOLTAGE_BAND: (f64, f64) = (0.85, 1.15);
/// Per-tick walk steps, matching the original mock generator.
const VOLTAGE_STEP: f64 = 0.1;
const CURRENT_STEP: f64 = 0.5;
/// Temperature relaxes toward ambient at this rate per tick.
const COOLING_RATE: f64 = 0.05;
/// Chance per tick of a transient heat excursion.
const EXCURSION_PROBABILITY: f64 = 0.02;

/// Produces successive readings per cell as a bounded random walk. Seeded
/// explicitly for reproducible runs; unseeded for live monitoring.
#[derive(Debug)]
pub struct TelemetryGenerator {
    rng: StdRng,
    tick_interval: TimeDelta,
    ambient: Celsius,
}

#[bon::bon]
impl TelemetryGenerator {
    #[builder]
    pub fn new(
        seed: Option<u64>,
        #[builder(default = TimeDelta::seconds(1))] tick_interval: TimeDelta,
        #[builder(default = Celsius(25.0))] ambient: Celsius,
    ) -> Self {
        Self {
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
            tick_interval,
            ambient,
        }
    }
}

impl TelemetryGenerator {
    /// Advances one cell by one simulation step and commits the reading to
    /// its history.
    pub fn tick(&mut self, cell: &mut Cell) -> Result<Reading, CoreError> {
        let reading = match cell.latest().copied() {
            Some(previous) => self.step(cell.config(), &previous),
            None => self.initial(cell.config()),
        };
        cell.record(reading)?;
        trace!(cell_id = cell.id(), ?reading, "ticked");
        Ok(reading)
    }

    fn initial(&mut self, config: &CellConfig) -> Reading {
        Reading {
            timestamp: Local::now(),
            voltage: config.nominal_voltage,
            current: Amps::ZERO,
            temperature: self.ambient + Celsius(self.rng.gen_range(0.0..=5.0)),
            capacity_remaining: config.rated_capacity,
        }
    }

    fn step(&mut self, config: &CellConfig, previous: &Reading) -> Reading {
        let timestamp = previous.timestamp + self.tick_interval;
        let voltage = (previous.voltage + Volts(self.rng.gen_range(-VOLTAGE_STEP..=VOLTAGE_STEP)))
            .clamp(
                config.nominal_voltage * VOLTAGE_BAND.0,
                config.nominal_voltage * VOLTAGE_BAND.1,
            );
        let current = (previous.current + Amps(self.rng.gen_range(-CURRENT_STEP..=CURRENT_STEP)))
            .clamp(-config.max_charge_current, config.max_discharge_current);
        // Positive current drains capacity, negative current restores it.
        let capacity_remaining = (previous.capacity_remaining - current * self.tick_interval)
            .clamp(AmpHours::ZERO, config.rated_capacity);
        Reading {
            timestamp,
            voltage,
            current,
            temperature: self.next_temperature(previous.temperature),
            capacity_remaining,
        }
    }

    fn next_temperature(&mut self, previous: Celsius) -> Celsius {
        let mut temperature = previous
            + (self.ambient - previous) * COOLING_RATE
            + Celsius(self.rng.gen_range(-0.5..=0.5));
        if self.rng.gen_bool(EXCURSION_PROBABILITY) {
            temperature += Celsius(self.rng.gen_range(2.0..=6.0));
        }
        temperature
    }
}
