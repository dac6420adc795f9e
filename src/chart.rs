use std::collections::BTreeMap;

use comfy_table::{Cell, CellAlignment, Table};
use itertools::Itertools;

use crate::{
    appliance::Source,
    quantity::{energy::KilowattHours, power::Watts, ratio::Percent},
    statistics::{scatter_points, summarize_by_source},
    store::RecordTable,
    tables::build_chart_table,
};

pub const NO_DATA: &str = "No data yet. Add appliances to see graphs.";

const WIDTH: usize = 40;
const HEIGHT: usize = 10;

#[derive(Copy, Clone, Debug, Default, clap::ValueEnum)]
pub enum ChartKind {
    /// Monthly consumption per source.
    #[default]
    Bar,

    /// Monthly consumption per source, as points on a line.
    Line,

    /// Share of each source in the total.
    Pie,

    /// Wattage against monthly consumption, one point per appliance.
    Scatter,
}

/// Render the chart as text.
#[must_use]
pub fn render(kind: ChartKind, table: &RecordTable) -> String {
    if table.is_empty() {
        return NO_DATA.to_owned();
    }
    match kind {
        ChartKind::Bar => format!("Energy by Source\n{}", bar(&summarize_by_source(table))),
        ChartKind::Line => format!("Energy Trend by Source\n{}", line(&summarize_by_source(table))),
        ChartKind::Pie => format!("Energy Share\n{}", pie(&summarize_by_source(table))),
        ChartKind::Scatter => {
            format!("Scatter: Wattage vs Energy\n{}", scatter(&scatter_points(table)))
        }
    }
}

fn bar(by_source: &BTreeMap<Source, KilowattHours>) -> Table {
    let max = by_source.values().max().copied().unwrap_or(KilowattHours::ZERO);
    let mut table = build_chart_table();
    for (source, consumption) in by_source {
        table.add_row(vec![
            Cell::new(source).fg(source.color()),
            Cell::new(format!("{consumption}/month")).set_alignment(CellAlignment::Right),
            Cell::new("█".repeat(scale(consumption.0, max.0, WIDTH))).fg(source.color()),
        ]);
    }
    table
}

fn line(by_source: &BTreeMap<Source, KilowattHours>) -> String {
    let max = by_source.values().max().copied().unwrap_or(KilowattHours::ZERO);
    by_source
        .iter()
        .map(|(source, consumption)| {
            let offset = " ".repeat(scale(consumption.0, max.0, WIDTH));
            format!("{source:>13} │{offset}●  {consumption}/month")
        })
        .join("\n")
}

fn pie(by_source: &BTreeMap<Source, KilowattHours>) -> Table {
    let total: KilowattHours = by_source.values().copied().sum();
    let mut table = build_chart_table();
    for (source, consumption) in by_source {
        let share = if total > KilowattHours::ZERO { *consumption / total } else { 0.0 };
        table.add_row(vec![
            Cell::new(source).fg(source.color()),
            Cell::new(Percent::from_proportion(share)).set_alignment(CellAlignment::Right),
            Cell::new("▒".repeat(scale(share, 1.0, WIDTH))).fg(source.color()),
        ]);
    }
    table
}

fn scatter(points: &[(Watts, KilowattHours)]) -> String {
    let (Some((min_wattage, max_wattage)), Some((min_consumption, max_consumption))) = (
        points.iter().map(|(wattage, _)| *wattage).minmax().into_option(),
        points.iter().map(|(_, consumption)| *consumption).minmax().into_option(),
    ) else {
        return NO_DATA.to_owned();
    };

    let mut grid = vec![vec![' '; WIDTH]; HEIGHT];
    for (wattage, consumption) in points {
        let column = position(wattage.0, min_wattage.0, max_wattage.0, WIDTH);
        let row = HEIGHT - 1 - position(consumption.0, min_consumption.0, max_consumption.0, HEIGHT);
        grid[row][column] = '●';
    }

    let mut lines = Vec::with_capacity(HEIGHT + 2);
    for (index, row) in grid.iter().enumerate() {
        let label = match index {
            0 => max_consumption.to_string(),
            _ if index == HEIGHT - 1 => min_consumption.to_string(),
            _ => String::new(),
        };
        lines.push(format!("{label:>12} │{}", row.iter().collect::<String>()));
    }
    lines.push(format!("{:>12} └{}", "", "─".repeat(WIDTH)));
    let half = WIDTH / 2;
    lines.push(format!(
        "{:>12}  {:<half$}{:>half$}",
        "",
        min_wattage.to_string(),
        max_wattage.to_string(),
    ));
    lines.join("\n")
}

/// Length of a bar for `value`, where `max` spans the full `width`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scale(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value / max * width as f64).round() as usize).min(width)
}

/// Cell index of `value` within `min..=max` laid over `cells` cells.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn position(value: f64, min: f64, max: f64, cells: usize) -> usize {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return 0;
    }
    (((value - min) / span * (cells - 1) as f64).round() as usize).min(cells - 1)
}
