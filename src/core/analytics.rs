use itertools::Itertools;

use crate::core::cell::Cell;

/// Derived per-cell metrics. Never stored: always recomputed as a pure
/// function of the cell's retained history, so it is safe to compute for
/// reporting at any point between ticks.
#[derive(Copy, Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Metrics {
    /// Fraction of rated capacity currently available, in `[0, 1]`.
    pub state_of_charge: f64,

    /// Discharged-to-charged energy ratio over the retained window,
    /// in `[0, 1]`. Exactly `1.0` when no charge energy was seen: with
    /// nothing paid in, nothing was lost. That is a deliberate edge-case
    /// policy, not a division blow-up.
    pub efficiency: f64,

    /// Instantaneous terminal power normalized by the chemistry's
    /// specific-power constant.
    pub power_density: f64,

    /// Least-squares slope of remaining capacity over time, in amp-hours
    /// per hour. Zero until at least two samples exist.
    pub state_of_health_trend: f64,
}

impl Metrics {
    #[must_use]
    pub fn compute(cell: &Cell) -> Self {
        let config = cell.config();
        let Some(latest) = cell.latest() else {
            // No telemetry yet: an empty window is trivially efficient.
            return Self {
                state_of_charge: 0.0,
                efficiency: 1.0,
                power_density: 0.0,
                state_of_health_trend: 0.0,
            };
        };
        Self {
            state_of_charge: latest.capacity_remaining / config.rated_capacity,
            efficiency: round_trip_efficiency(cell),
            power_density: latest.power() / config.chemistry.specific_power(),
            state_of_health_trend: capacity_slope(cell),
        }
    }
}

/// Integrates terminal energy over the retained window, split by current
/// direction, and returns the discharge-to-charge ratio capped at `1.0`.
fn round_trip_efficiency(cell: &Cell) -> f64 {
    let mut discharged_wh = 0.0;
    let mut charged_wh = 0.0;
    for (previous, next) in cell.history().tuple_windows() {
        let hours = (next.timestamp - previous.timestamp).as_seconds_f64() / 3600.0;
        if hours <= 0.0 {
            continue;
        }
        let energy_wh = previous.power().0 * hours;
        if previous.current.is_discharge() {
            discharged_wh += energy_wh;
        } else if previous.current.is_charge() {
            charged_wh += -energy_wh;
        }
    }
    if charged_wh <= 0.0 {
        1.0
    } else {
        (discharged_wh / charged_wh).clamp(0.0, 1.0)
    }
}

/// Linear-regression slope of `capacity_remaining` against hours since the
/// first retained sample.
fn capacity_slope(cell: &Cell) -> f64 {
    let Some(first) = cell.history().next() else {
        return 0.0;
    };
    let points = cell
        .history()
        .map(|reading| {
            let hours = (reading.timestamp - first.timestamp).as_seconds_f64() / 3600.0;
            (hours, reading.capacity_remaining.0)
        })
        .collect_vec();
    if points.len() < 2 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let covariance: f64 =
        points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let variance: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if variance == 0.0 { 0.0 } else { covariance / variance }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::{Local, TimeDelta};

    use super::*;
    use crate::{
        core::{cell::CellConfig, chemistry::Chemistry, reading::Reading},
        quantity::{capacity::AmpHours, current::Amps, temperature::Celsius, voltage::Volts},
    };

    fn cell_with_samples(samples: &[(Amps, AmpHours)]) -> Cell {
        let mut cell = Cell::new("cell-1", CellConfig::for_chemistry(Chemistry::Lfp)).unwrap();
        let start = Local::now();
        for (n, (current, capacity_remaining)) in samples.iter().enumerate() {
            cell.record(Reading {
                timestamp: start + TimeDelta::seconds(n as i64),
                voltage: Volts(3.2),
                current: *current,
                temperature: Celsius(25.0),
                capacity_remaining: *capacity_remaining,
            })
            .unwrap();
        }
        cell
    }

    #[test]
    fn state_of_charge_is_latest_capacity_over_rated() {
        let cell = cell_with_samples(&[(Amps::ZERO, AmpHours(100.0)), (Amps::ZERO, AmpHours(40.0))]);
        assert_relative_eq!(Metrics::compute(&cell).state_of_charge, 0.4);
    }

    #[test]
    fn efficiency_is_one_without_charging() {
        let cell = cell_with_samples(&[
            (Amps(5.0), AmpHours(100.0)),
            (Amps(5.0), AmpHours(99.9)),
            (Amps(5.0), AmpHours(99.8)),
        ]);
        assert_relative_eq!(Metrics::compute(&cell).efficiency, 1.0);
    }

    #[test]
    fn efficiency_stays_within_unit_interval() {
        // Heavy discharge after a sliver of charging would push the raw
        // ratio above one; the metric is capped.
        let cell = cell_with_samples(&[
            (Amps(-1.0), AmpHours(99.0)),
            (Amps(8.0), AmpHours(99.1)),
            (Amps(8.0), AmpHours(98.0)),
        ]);
        let efficiency = Metrics::compute(&cell).efficiency;
        assert!((0.0..=1.0).contains(&efficiency));
        assert_relative_eq!(efficiency, 1.0);
    }

    #[test]
    fn balanced_cycle_reports_partial_efficiency() {
        // One hour-equivalent of charging at 8 A, then discharging at 4 A:
        // the ratio lands at one half.
        let cell = cell_with_samples(&[
            (Amps(-8.0), AmpHours(50.0)),
            (Amps(4.0), AmpHours(58.0)),
            (Amps(4.0), AmpHours(54.0)),
        ]);
        assert_relative_eq!(Metrics::compute(&cell).efficiency, 0.5);
    }

    #[test]
    fn trend_requires_two_samples() {
        let cell = cell_with_samples(&[(Amps::ZERO, AmpHours(100.0))]);
        assert_relative_eq!(Metrics::compute(&cell).state_of_health_trend, 0.0);
    }

    #[test]
    fn steady_discharge_has_negative_trend() {
        let cell = cell_with_samples(&[
            (Amps(5.0), AmpHours(100.0)),
            (Amps(5.0), AmpHours(99.0)),
            (Amps(5.0), AmpHours(98.0)),
        ]);
        assert!(Metrics::compute(&cell).state_of_health_trend < 0.0);
    }

    #[test]
    fn power_density_uses_the_chemistry_constant() {
        let cell = cell_with_samples(&[(Amps(10.0), AmpHours(50.0))]);
        // 3.2 V × 10 A over LFP's 1000 W/kg.
        assert_relative_eq!(Metrics::compute(&cell).power_density, 0.032);
    }
}
