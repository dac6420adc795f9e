use std::ops::Mul;

use crate::quantity::mass::{Kilograms, KilogramsPerKilowattHour};

quantity!(WattHours, suffix: "Wh", precision: 0);
quantity!(KilowattHours, suffix: "kWh", precision: 2);

impl From<WattHours> for KilowattHours {
    fn from(watt_hours: WattHours) -> Self {
        Self(watt_hours.0 / 1000.0)
    }
}

impl Mul<KilogramsPerKilowattHour> for KilowattHours {
    type Output = Kilograms;

    fn mul(self, factor: KilogramsPerKilowattHour) -> Self::Output {
        Kilograms(self.0 * factor.0)
    }
}
