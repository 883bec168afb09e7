use std::ops::Mul;

use crate::quantity::{current::Amps, power::Watts};

quantity!(Volts, "V");

impl Mul<Amps> for Volts {
    type Output = Watts;

    fn mul(self, rhs: Amps) -> Self::Output {
        Watts(self.0 * rhs.0)
    }
}
