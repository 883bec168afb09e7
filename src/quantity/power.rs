use std::ops::Div;

quantity!(Watts, "W");

/// Chemistry-specific safe continuous power per unit mass.
quantity!(SpecificPower, "W/kg");

impl Div<SpecificPower> for Watts {
    type Output = f64;

    /// Mass-normalized power density ratio.
    fn div(self, rhs: SpecificPower) -> Self::Output {
        self.0 / rhs.0
    }
}
