use std::ops::Div;

quantity!(AmpHours, "Ah");

impl Div<AmpHours> for AmpHours {
    type Output = f64;

    fn div(self, rhs: AmpHours) -> Self::Output {
        self.0 / rhs.0
    }
}
