use anyhow::{bail, Context, Result};
use cadence_core::models::{DayRegion, TimeRegion};
use cadence_core::recurrence::RecurrenceManager;
use owo_colors::OwoColorize;
use serde_json::json;

use crate::cli::{DayRegionCommand, RegionCommand};
use crate::config::Config;
use crate::parser::{parse_date, parse_datetime};
use crate::views::table::display_region;

pub fn show_region(command: RegionCommand, config: &Config) -> Result<()> {
    let start = parse_datetime(&command.start).context("Invalid --start")?;
    let end = parse_datetime(&command.end).context("Invalid --end")?;
    if end <= start {
        bail!("Region end {} must be after its start {}", end, start);
    }
    let on = parse_date(&command.on).context("Invalid --on")?;

    let mut region = TimeRegion::new(start, end);
    region.label = command.label;
    region.recurrence_rule = command.rrule;

    let manager = RecurrenceManager::new(config.expansion());
    let expanded = region.expanded_for_date_with(on, &manager);

    if command.json {
        println!("{}", serde_json::to_string_pretty(&expanded)?);
        return Ok(());
    }

    match expanded {
        Some(region) => display_region(&region, &config.date_format),
        None => println!("{} {}", "No match on".dimmed(), on),
    }
    Ok(())
}

pub fn show_day_region(command: DayRegionCommand, config: &Config) -> Result<()> {
    let date = parse_date(&command.date).context("Invalid --date")?;
    let on = parse_date(&command.on).context("Invalid --on")?;

    let mut region = DayRegion::new(date);
    region.recurrence_rule = command.rrule;

    let manager = RecurrenceManager::new(config.expansion());
    let applies = region.applies_to_with(on, &manager);

    if command.json {
        let output = json!({ "date": on, "applies": applies });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if applies {
        println!("{} {}", "✓ Applies to".green(), on);
    } else {
        println!("{} {}", "✗ Does not apply to".yellow(), on);
    }
    Ok(())
}
