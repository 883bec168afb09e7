use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::{
        alert::{Alert, AlertEngine, AlertId, Severity},
        analytics::Metrics,
        cell::{Cell, CellId},
        control::Mode,
        error::CoreError,
        reading::Reading,
        telemetry::TelemetryGenerator,
    },
    prelude::*,
};

/// Reason recorded when a critical alert trips the bench autonomously.
pub const AUTO_STOP_REASON: &str = "auto: critical alert";

/// Process-wide state of the bench: the configured cells, the active alert
/// set, and the control-panel mode. All mutation goes through `&mut self`,
/// which keeps alert and mode writes serialized.
pub struct SystemState {
    bench_name: String,
    group_number: u32,
    mode: Mode,
    cells: BTreeMap<CellId, Cell>,
    active_alerts: BTreeMap<AlertId, Alert>,
    stop_reason: Option<String>,
}

#[bon::bon]
impl SystemState {
    /// Boots in `Paused`: nothing moves until the operator starts the
    /// bench.
    #[builder]
    pub fn new(
        #[builder(into)] bench_name: String,
        #[builder(default = 1)] group_number: u32,
        cells: Vec<Cell>,
    ) -> Self {
        Self {
            bench_name,
            group_number,
            mode: Mode::Paused,
            cells: cells.into_iter().map(|cell| (cell.id().to_owned(), cell)).collect(),
            active_alerts: BTreeMap::new(),
            stop_reason: None,
        }
    }
}

impl SystemState {
    #[must_use]
    pub fn bench_name(&self) -> &str {
        &self.bench_name
    }

    #[must_use]
    pub const fn group_number(&self) -> u32 {
        self.group_number
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn active_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.active_alerts.values()
    }

    pub fn start(&mut self) -> Result<(), CoreError> {
        self.mode = self.mode.try_start()?;
        info!(bench_name = %self.bench_name, "started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), CoreError> {
        self.mode = self.mode.try_pause()?;
        info!(bench_name = %self.bench_name, "paused");
        Ok(())
    }

    /// The one safety action that cannot be refused: halts generation and
    /// freezes the active alert set. Idempotent; the first reason sticks.
    pub fn emergency_stop(&mut self, reason: &str) {
        if self.mode == Mode::EmergencyStopped {
            return;
        }
        warn!(bench_name = %self.bench_name, reason, "emergency stop");
        self.mode = Mode::EmergencyStopped;
        self.stop_reason = Some(reason.to_owned());
    }

    /// Leaves `EmergencyStopped` for `Paused`, but only once every active
    /// critical alert has been explicitly acknowledged.
    pub fn reset(&mut self, acknowledged: &BTreeSet<AlertId>) -> Result<(), CoreError> {
        let next = self.mode.try_reset()?;
        let unacknowledged: Vec<AlertId> = self
            .active_alerts
            .values()
            .filter(|alert| alert.severity == Severity::Critical)
            .map(|alert| alert.id.clone())
            .filter(|id| !acknowledged.contains(id))
            .collect();
        if !unacknowledged.is_empty() {
            return Err(CoreError::UnacknowledgedCritical { unacknowledged });
        }
        self.mode = next;
        self.stop_reason = None;
        info!(bench_name = %self.bench_name, "reset to paused");
        Ok(())
    }

    /// One discrete simulation step: telemetry, metrics, and alert
    /// evaluation for every cell in id order. A cell that fails its tick is
    /// skipped without aborting the others; a critical alert stops the
    /// bench before the remaining cells are reached.
    #[instrument(skip_all, fields(bench_name = %self.bench_name))]
    pub fn tick(&mut self, generator: &mut TelemetryGenerator) -> Result<(), CoreError> {
        if self.mode != Mode::Running {
            return Err(CoreError::Generator {
                reason: format!("tick requested while in {:?} mode", self.mode),
            });
        }
        let ids: Vec<CellId> = self.cells.keys().cloned().collect();
        for id in ids {
            if self.mode != Mode::Running {
                break;
            }
            if let Err(error) = self.tick_cell(&id, generator) {
                warn!(cell_id = %id, %error, "cell tick failed, skipping");
            }
        }
        Ok(())
    }

    fn tick_cell(&mut self, id: &str, generator: &mut TelemetryGenerator) -> Result<(), CoreError> {
        let Some(cell) = self.cells.get_mut(id) else {
            return Ok(());
        };
        generator.tick(cell)?;
        let metrics = Metrics::compute(cell);
        let alerts = AlertEngine::evaluate(cell, &metrics);
        let critical_raised =
            alerts.iter().any(|alert| alert.severity == Severity::Critical);
        self.merge_alerts(id, alerts);
        if critical_raised {
            self.emergency_stop(AUTO_STOP_REASON);
        }
        Ok(())
    }

    /// Replaces this cell's slice of the active set: re-raised alerts get a
    /// fresh `raised_at`, cleared conditions drop out the same cycle.
    fn merge_alerts(&mut self, cell_id: &str, alerts: Vec<Alert>) {
        self.active_alerts.retain(|_, alert| alert.cell_id != cell_id);
        for alert in alerts {
            debug!(id = %alert.id, severity = ?alert.severity, "alert active");
            self.active_alerts.insert(alert.id.clone(), alert);
        }
    }

    /// A consistent point-in-time view for the dashboard and the exporter.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            cells: self
                .cells
                .iter()
                .map(|(id, cell)| {
                    (
                        id.clone(),
                        CellSnapshot {
                            reading: cell.latest().copied(),
                            metrics: Metrics::compute(cell),
                        },
                    )
                })
                .collect(),
            alerts: self.active_alerts.values().cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub cells: BTreeMap<CellId, CellSnapshot>,
    pub alerts: Vec<Alert>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct CellSnapshot {
    pub reading: Option<Reading>,
    pub metrics: Metrics,
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::{
        core::{alert::AlertKind, cell::CellConfig, chemistry::Chemistry},
        quantity::{capacity::AmpHours, current::Amps, temperature::Celsius, voltage::Volts},
    };

    fn bench(cells: Vec<Cell>) -> SystemState {
        SystemState::builder().bench_name("test-bench").cells(cells).build()
    }

    fn lfp_cell(id: &str) -> Cell {
        Cell::new(id, CellConfig::for_chemistry(Chemistry::Lfp)).unwrap()
    }

    fn drained_reading(capacity_remaining: AmpHours) -> Reading {
        Reading {
            timestamp: Local::now(),
            voltage: Volts(3.2),
            current: Amps(5.0),
            temperature: Celsius(25.0),
            capacity_remaining,
        }
    }

    #[test]
    fn boots_paused_and_refuses_to_tick() {
        let mut state = bench(vec![lfp_cell("cell-1")]);
        assert_eq!(state.mode(), Mode::Paused);
        let mut generator = TelemetryGenerator::builder().seed(1).build();
        assert!(matches!(
            state.tick(&mut generator),
            Err(CoreError::Generator { .. }),
        ));
    }

    #[test]
    fn running_ticks_append_history_for_every_cell() {
        let mut state = bench(vec![lfp_cell("cell-1"), lfp_cell("cell-2")]);
        let mut generator = TelemetryGenerator::builder().seed(1).build();
        state.start().unwrap();
        for _ in 0..5 {
            state.tick(&mut generator).unwrap();
        }
        for cell in state.cells() {
            assert_eq!(cell.history().len(), 5);
        }
    }

    #[test]
    fn critical_alert_forces_emergency_stop_within_the_tick() {
        // An LFP cell drained to 2.5 Ah of its rated 100 Ah: SoC 0.025 is
        // critically low and must stop the bench before the tick returns.
        let mut cell = lfp_cell("cell-1");
        cell.record(drained_reading(AmpHours(2.5))).unwrap();
        let mut state = bench(vec![cell]);
        state.start().unwrap();

        let mut generator = TelemetryGenerator::builder().seed(1).build();
        state.tick(&mut generator).unwrap();

        assert_eq!(state.mode(), Mode::EmergencyStopped);
        assert_eq!(state.stop_reason(), Some(AUTO_STOP_REASON));
        assert!(
            state
                .active_alerts()
                .any(|alert| alert.kind == AlertKind::LowCapacity
                    && alert.severity == Severity::Critical),
        );
    }

    #[test]
    fn emergency_stop_halts_remaining_cells_in_the_same_tick() {
        let mut tripping = lfp_cell("cell-1");
        tripping.record(drained_reading(AmpHours(2.0))).unwrap();
        let healthy = lfp_cell("cell-2");
        let mut state = bench(vec![tripping, healthy]);
        state.start().unwrap();

        let mut generator = TelemetryGenerator::builder().seed(1).build();
        state.tick(&mut generator).unwrap();

        assert_eq!(state.mode(), Mode::EmergencyStopped);
        // cell-1 ticked once before tripping; cell-2 never got its turn.
        assert_eq!(state.cell("cell-1").unwrap().history().len(), 2);
        assert_eq!(state.cell("cell-2").unwrap().history().len(), 0);
    }

    #[test]
    fn emergency_stop_is_idempotent_and_keeps_the_first_reason() {
        let mut state = bench(vec![lfp_cell("cell-1")]);
        state.emergency_stop("operator hit the button");
        state.emergency_stop("second press");
        assert_eq!(state.mode(), Mode::EmergencyStopped);
        assert_eq!(state.stop_reason(), Some("operator hit the button"));
    }

    #[test]
    fn reset_requires_acknowledging_critical_alerts() {
        let mut cell = lfp_cell("cell-1");
        cell.record(drained_reading(AmpHours(2.5))).unwrap();
        let mut state = bench(vec![cell]);
        state.start().unwrap();
        let mut generator = TelemetryGenerator::builder().seed(1).build();
        state.tick(&mut generator).unwrap();
        assert_eq!(state.mode(), Mode::EmergencyStopped);

        let result = state.reset(&BTreeSet::new());
        assert!(matches!(result, Err(CoreError::UnacknowledgedCritical { .. })));
        assert_eq!(state.mode(), Mode::EmergencyStopped);

        let acknowledged: BTreeSet<AlertId> = state
            .active_alerts()
            .filter(|alert| alert.severity == Severity::Critical)
            .map(|alert| alert.id.clone())
            .collect();
        state.reset(&acknowledged).unwrap();
        assert_eq!(state.mode(), Mode::Paused);
        assert_eq!(state.stop_reason(), None);
    }

    #[test]
    fn reset_outside_emergency_stop_is_an_invalid_transition() {
        let mut state = bench(vec![lfp_cell("cell-1")]);
        assert!(matches!(
            state.reset(&BTreeSet::new()),
            Err(CoreError::InvalidTransition { action: "reset", .. }),
        ));
    }

    #[test]
    fn cleared_conditions_drop_out_next_evaluation() {
        let mut cell = lfp_cell("cell-1");
        let mut reading = drained_reading(AmpHours(80.0));
        reading.temperature = Celsius(80.0);
        cell.record(reading).unwrap();
        let mut state = bench(vec![cell]);

        // Seed the active set directly, then simulate the condition
        // clearing on the next cycle.
        let metrics = Metrics::compute(state.cell("cell-1").unwrap());
        let alerts = AlertEngine::evaluate(state.cell("cell-1").unwrap(), &metrics);
        assert_eq!(alerts.len(), 1);
        state.merge_alerts("cell-1", alerts);
        assert_eq!(state.active_alerts().count(), 1);

        state.merge_alerts("cell-1", Vec::new());
        assert_eq!(state.active_alerts().count(), 0);
    }

    #[test]
    fn snapshot_reflects_cells_alerts_and_mode() {
        let mut state = bench(vec![lfp_cell("cell-1"), lfp_cell("cell-2")]);
        let mut generator = TelemetryGenerator::builder().seed(9).build();
        state.start().unwrap();
        state.tick(&mut generator).unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.mode, state.mode());
        assert_eq!(snapshot.cells.len(), 2);
        assert!(snapshot.cells["cell-1"].reading.is_some());
        assert_eq!(snapshot.alerts.len(), state.active_alerts().count());
    }
}
