use crate::core::error::CoreError;

/// Operational mode of the whole bench. The system boots `Paused`;
/// `EmergencyStopped` is terminal until an explicit reset.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Running,
    Paused,
    EmergencyStopped,
}

impl Mode {
    /// `Paused → Running`.
    pub fn try_start(self) -> Result<Self, CoreError> {
        match self {
            Self::Paused => Ok(Self::Running),
            mode => Err(CoreError::InvalidTransition { action: "start", mode }),
        }
    }

    /// `Running → Paused`.
    pub fn try_pause(self) -> Result<Self, CoreError> {
        match self {
            Self::Running => Ok(Self::Paused),
            mode => Err(CoreError::InvalidTransition { action: "pause", mode }),
        }
    }

    /// Gate for `reset()`; the acknowledgment check lives with the alert
    /// set, not here.
    pub fn try_reset(self) -> Result<Self, CoreError> {
        match self {
            Self::EmergencyStopped => Ok(Self::Paused),
            mode => Err(CoreError::InvalidTransition { action: "reset", mode }),
        }
    }
}
