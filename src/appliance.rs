use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use comfy_table::Color;
use serde::{Deserialize, Serialize};

use crate::{
    quantity::{energy::KilowattHours, power::Watts, time::Hours},
    statistics::monthly_consumption,
};

/// Where the energy of an appliance comes from.
///
/// Stored as its display label and read back through [`FromStr`], so that the file accepts
/// the same spellings as the form.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde_with::DeserializeFromStr,
    serde_with::SerializeDisplay,
)]
pub enum Source {
    Renewable,
    NonRenewable,
}

impl Source {
    pub const fn color(self) -> Color {
        match self {
            Self::Renewable => Color::Green,
            Self::NonRenewable => Color::Red,
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Renewable => f.pad("Renewable"),
            Self::NonRenewable => f.pad("Non-Renewable"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown energy source `{0}`, expected `Renewable` or `Non-Renewable`")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    /// Case-insensitive, ignores `-`, `_` and spaces: `non-renewable` and `NonRenewable` both work.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let normalized: String = text
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "renewable" => Ok(Self::Renewable),
            "nonrenewable" => Ok(Self::NonRenewable),
            _ => Err(UnknownSource(text.to_owned())),
        }
    }
}

/// Single row of the appliance table.
///
/// Field names are the CSV column headers.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct ApplianceRecord {
    #[serde(rename = "Appliance")]
    #[builder(into)]
    pub name: String,

    #[serde(rename = "Wattage")]
    pub wattage: Watts,

    #[serde(rename = "Hours")]
    pub hours_per_day: Hours,

    #[serde(rename = "Source")]
    pub source: Source,
}

impl ApplianceRecord {
    pub fn monthly_consumption(&self) -> KilowattHours {
        monthly_consumption(self.wattage, self.hours_per_day)
    }
}
