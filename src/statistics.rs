use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use itertools::Itertools;

use crate::{
    appliance::Source,
    quantity::{
        energy::KilowattHours,
        mass::{Kilograms, KilogramsPerKilowattHour},
        power::Watts,
        time::Hours,
    },
    store::RecordTable,
};

pub const DAYS_PER_MONTH: f64 = 30.0;

/// Grid emission factor applied to non-renewable consumption.
pub const EMISSION_FACTOR: KilogramsPerKilowattHour = KilogramsPerKilowattHour(0.82);

/// Monthly consumption: `wattage × hours per day × 30 / 1000`.
///
/// Negative inputs are not rejected, the formula is applied as is.
pub fn monthly_consumption(wattage: Watts, hours_per_day: Hours) -> KilowattHours {
    KilowattHours::from(wattage * hours_per_day * DAYS_PER_MONTH)
}

/// Total monthly consumption per source.
///
/// Sources without any records are absent from the map.
#[must_use]
pub fn summarize_by_source(table: &RecordTable) -> BTreeMap<Source, KilowattHours> {
    table
        .iter()
        .map(|record| (record.source, record.monthly_consumption()))
        .into_grouping_map()
        .sum()
        .into_iter()
        .collect()
}

/// Wattage against monthly consumption, one point per record in table order.
#[must_use]
pub fn scatter_points(table: &RecordTable) -> Vec<(Watts, KilowattHours)> {
    table.iter().map(|record| (record.wattage, record.monthly_consumption())).collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Totals {
    pub renewable: KilowattHours,
    pub non_renewable: KilowattHours,
    pub grand_total: KilowattHours,
    pub co2_estimate: Kilograms,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Summary {
    NoData,
    Totals(Totals),
}

impl Summary {
    #[must_use]
    pub const fn totals(&self) -> Option<&Totals> {
        match self {
            Self::NoData => None,
            Self::Totals(totals) => Some(totals),
        }
    }

    /// Renewable fraction of the grand total, if there is anything to divide.
    #[must_use]
    pub fn renewable_share(&self) -> Option<f64> {
        self.totals()
            .filter(|totals| totals.grand_total != KilowattHours::ZERO)
            .map(|totals| totals.renewable / totals.grand_total)
    }
}

#[must_use]
pub fn compute_summary(table: &RecordTable) -> Summary {
    if table.is_empty() {
        return Summary::NoData;
    }
    let total_of = |source: Source| -> KilowattHours {
        table
            .iter()
            .filter(|record| record.source == source)
            .map(|record| record.monthly_consumption())
            .sum()
    };
    let non_renewable = total_of(Source::NonRenewable);
    Summary::Totals(Totals {
        renewable: total_of(Source::Renewable),
        non_renewable,
        grand_total: table.iter().map(|record| record.monthly_consumption()).sum(),
        co2_estimate: non_renewable * EMISSION_FACTOR,
    })
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "No data yet."),
            Self::Totals(totals) => {
                writeln!(f, "Total Renewable: {}/month", totals.renewable)?;
                writeln!(f, "Total Non-Renewable: {}/month", totals.non_renewable)?;
                writeln!(f, "Grand Total: {}/month", totals.grand_total)?;
                write!(f, "Estimated CO₂: {}/month", totals.co2_estimate)
            }
        }
    }
}
