use std::ops::RangeInclusive;

use crate::quantity::{power::SpecificPower, temperature::Celsius, voltage::Volts};

/// Battery cell technology class.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Chemistry {
    /// Lithium iron phosphate.
    Lfp,
    /// Nickel manganese cobalt.
    Nmc,
    /// Lithium titanate.
    Lto,
    /// Lithium cobalt oxide.
    Lco,
}

impl Chemistry {
    pub const ALL: [Self; 4] = [Self::Lfp, Self::Nmc, Self::Lto, Self::Lco];

    #[must_use]
    pub const fn nominal_voltage(self) -> Volts {
        match self {
            Self::Lfp => Volts(3.2),
            Self::Nmc => Volts(3.6),
            Self::Lto => Volts(2.4),
            Self::Lco => Volts(3.7),
        }
    }

    #[must_use]
    pub const fn default_temp_safe_range(self) -> RangeInclusive<Celsius> {
        match self {
            Self::Lfp | Self::Nmc => Celsius(0.0)..=Celsius(60.0),
            // LTO tolerates sub-zero operation.
            Self::Lto => Celsius(-20.0)..=Celsius(60.0),
            Self::Lco => Celsius(0.0)..=Celsius(50.0),
        }
    }

    /// Safe continuous power per unit mass. LTO and LFP sustain higher
    /// continuous power than NMC and LCO.
    #[must_use]
    pub const fn specific_power(self) -> SpecificPower {
        match self {
            Self::Lfp => SpecificPower(1000.0),
            Self::Nmc => SpecificPower(600.0),
            Self::Lto => SpecificPower(1200.0),
            Self::Lco => SpecificPower(500.0),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lfp => "lfp",
            Self::Nmc => "nmc",
            Self::Lto => "lto",
            Self::Lco => "lco",
        }
    }
}

impl std::fmt::Display for Chemistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
