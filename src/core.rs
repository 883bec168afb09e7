mod alert;
mod analytics;
mod cell;
mod chemistry;
mod control;
mod error;
mod reading;
mod system;
mod telemetry;

pub use self::{
    alert::{Alert, AlertEngine, AlertId, AlertKind, Severity, Thresholds},
    analytics::Metrics,
    cell::{Cell, CellConfig, CellId, HISTORY_RETENTION},
    chemistry::Chemistry,
    control::Mode,
    error::CoreError,
    reading::Reading,
    system::{CellSnapshot, Snapshot, SystemState},
    telemetry::TelemetryGenerator,
};
