use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::dashboard::JobStatus;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn status_color(status: JobStatus) -> TableColor {
    match status {
        JobStatus::Success => TableColor::Green,
        JobStatus::Failed => TableColor::Red,
        JobStatus::Running => TableColor::Yellow,
        JobStatus::Pending => TableColor::DarkGrey,
    }
}

pub fn status_cell(status: JobStatus) -> Cell {
    Cell::new(status.as_str()).fg(status_color(status))
}

/// Remaining quota, red under 10% and yellow under 25% of the limit.
pub fn color_coded_quota_cell(remaining: u32, limit: u32) -> Cell {
    let text = format!("{remaining}/{limit}");
    let ratio = if limit == 0 {
        0.0
    } else {
        f64::from(remaining) / f64::from(limit)
    };
    if ratio < 0.10 {
        Cell::new(text).fg(TableColor::Red)
    } else if ratio < 0.25 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Green)
    }
}
