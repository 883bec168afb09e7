use crate::core::{alert::AlertId, control::Mode};

/// Errors the monitoring core surfaces to its caller. None of them are
/// retried automatically; a generator failure is fatal to the affected
/// cell's tick only.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad setup parameters, rejected before any state change.
    #[error("invalid cell configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Illegal control action; the state is left unchanged.
    #[error("cannot {action} while in {mode:?} mode")]
    InvalidTransition { action: &'static str, mode: Mode },

    /// Reset is blocked until the operator acknowledges every active
    /// critical alert.
    #[error("critical alerts not acknowledged: {unacknowledged:?}")]
    UnacknowledgedCritical { unacknowledged: Vec<AlertId> },

    /// Sequencing defect: telemetry was requested in the wrong mode or
    /// produced an invariant-violating reading.
    #[error("telemetry generator failure: {reason}")]
    Generator { reason: String },
}
