use std::ops::Mul;

use chrono::TimeDelta;

use crate::quantity::capacity::AmpHours;

quantity!(Amps, "A");

impl Amps {
    /// Positive current is discharge, negative is charge.
    #[must_use]
    pub fn is_discharge(self) -> bool {
        self > Self::ZERO
    }

    #[must_use]
    pub fn is_charge(self) -> bool {
        self < Self::ZERO
    }
}

impl Mul<TimeDelta> for Amps {
    type Output = AmpHours;

    fn mul(self, rhs: TimeDelta) -> Self::Output {
        AmpHours(self.0 * rhs.as_seconds_f64() / 3600.0)
    }
}
