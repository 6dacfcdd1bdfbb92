use cadence_core::models::TimeRegion;
use cadence_core::RuleDescriptor;
use chrono::{Datelike, NaiveDateTime};
use comfy_table::{Attribute, Cell, Color, Row, Table};

pub fn display_rule(rule: &RuleDescriptor) {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    let mut add = |field: &str, value: String| {
        let mut row = Row::new();
        row.add_cell(Cell::new(field).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(value));
        table.add_row(row);
    };

    add("Frequency", rule.frequency().to_string());
    add("Interval", rule.interval().to_string());
    if let Some(count) = rule.count() {
        add("Count", count.to_string());
    }
    if let Some(until) = rule.until() {
        add("Until (inclusive)", until.last_day().to_string());
    }
    add("Ends", if rule.is_finite() { "Yes" } else { "Never" }.to_string());
    add_set(&mut add, "By day", rule.by_week_days().iter());
    add_set(&mut add, "By month day", rule.by_month_days().iter());
    add_set(&mut add, "By month", rule.by_months().iter());
    add_set(&mut add, "By year day", rule.by_year_days().iter());
    add_set(&mut add, "By week number", rule.by_week_numbers().iter());
    add_set(&mut add, "By set position", rule.by_set_positions().iter());

    println!("{table}");
}

fn add_set<T: ToString>(
    add: &mut impl FnMut(&str, String),
    field: &str,
    values: impl Iterator<Item = T>,
) {
    let values: Vec<String> = values.map(|v| v.to_string()).collect();
    if !values.is_empty() {
        add(field, values.join(", "));
    }
}

pub fn display_occurrences(occurrences: &[NaiveDateTime], date_format: &str) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Occurrence", "Weekday"]);

    for (i, occurrence) in occurrences.iter().enumerate() {
        let mut row = Row::new();
        row.add_cell(Cell::new(i + 1));
        row.add_cell(Cell::new(occurrence.format(date_format)));

        let weekday = occurrence.weekday();
        let mut weekday_cell = Cell::new(weekday);
        if weekday.number_from_monday() > 5 {
            weekday_cell = weekday_cell.fg(Color::DarkGrey);
        }
        row.add_cell(weekday_cell);
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_region(region: &TimeRegion, date_format: &str) {
    let mut table = Table::new();
    table.set_header(vec!["Label", "Start", "End", "Duration", "Blocking"]);

    let minutes = region.duration().num_minutes();
    let mut row = Row::new();
    row.add_cell(Cell::new(region.label.as_deref().unwrap_or("None")));
    row.add_cell(Cell::new(region.start.format(date_format)));
    row.add_cell(Cell::new(region.end.format(date_format)));
    row.add_cell(Cell::new(format!("{}h {:02}m", minutes / 60, minutes % 60)));
    row.add_cell(if region.block_interaction {
        Cell::new("Yes").fg(Color::Red)
    } else {
        Cell::new("No")
    });
    table.add_row(row);

    println!("{table}");
}
