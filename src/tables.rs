use comfy_table::{Attribute, Cell, CellAlignment, Table, modifiers, presets};

use crate::store::RecordTable;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_records_table(records: &RecordTable) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Appliance", "Wattage", "Per day", "Source", "Monthly"]);
    for (index, record) in records.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).add_attribute(Attribute::Dim),
            Cell::new(&record.name),
            Cell::new(record.wattage).set_alignment(CellAlignment::Right),
            Cell::new(record.hours_per_day).set_alignment(CellAlignment::Right),
            Cell::new(record.source).fg(record.source.color()),
            Cell::new(record.monthly_consumption()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Borderless table for chart rows.
pub fn build_chart_table() -> Table {
    let mut table = new_table();
    table.load_preset(presets::NOTHING);
    table
}
