use anyhow::{Context, Result};
use cadence_core::error::CoreError;
use cadence_core::models::RecurrenceException;
use cadence_core::recurrence::RecurrenceManager;
use cadence_core::{apply_exceptions, RuleDescriptor};
use chrono::{Duration, Local, NaiveDateTime};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::cli::{EngineArg, NextCommand, OccurrencesCommand};
use crate::config::Config;
use crate::parser::{parse_date, parse_datetime};
use crate::views::table::display_occurrences;

fn manager_for(config: &Config, engine: Option<EngineArg>) -> RecurrenceManager {
    let mut expansion = config.expansion();
    if let Some(engine) = engine {
        expansion.engine = engine.into();
    }
    RecurrenceManager::new(expansion)
}

fn parse_rule(text: &str) -> Result<RuleDescriptor> {
    Ok(text.parse::<RuleDescriptor>().map_err(CoreError::from)?)
}

pub fn list_occurrences(command: OccurrencesCommand, config: &Config) -> Result<()> {
    let rule = parse_rule(&command.rule)?;
    let anchor = parse_datetime(&command.anchor).context("Invalid --anchor")?;
    let from = match command.from.as_deref() {
        Some(from) => parse_datetime(from).context("Invalid --from")?,
        None => anchor,
    };
    let to = match command.to.as_deref() {
        Some(to) => parse_datetime(to).context("Invalid --to")?,
        None => from
            .checked_add_signed(Duration::days(i64::from(config.default_window_days)))
            .unwrap_or(NaiveDateTime::MAX),
    };

    let manager = manager_for(config, command.engine);
    debug!(engine = manager.generator_name(), %from, %to, "Listing occurrences");
    let mut occurrences = manager.occurrences_between(&rule, anchor, from, to)?;

    if !command.skip.is_empty() {
        let exceptions = command
            .skip
            .iter()
            .map(|date| {
                parse_date(date).map(|original_date| RecurrenceException::Deleted { original_date })
            })
            .collect::<Result<Vec<_>>>()
            .context("Invalid --skip")?;
        occurrences = apply_exceptions(occurrences, &exceptions);
    }
    if let Some(limit) = command.limit {
        occurrences.truncate(limit);
    }

    if command.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        display_occurrences(&occurrences, &config.date_format);
    }
    Ok(())
}

pub fn next_occurrence(command: NextCommand, config: &Config) -> Result<()> {
    let rule = parse_rule(&command.rule)?;
    let anchor = parse_datetime(&command.anchor).context("Invalid --anchor")?;
    let after = match command.after.as_deref() {
        Some(after) => parse_datetime(after).context("Invalid --after")?,
        None => Local::now().naive_local(),
    };

    let manager = manager_for(config, command.engine);
    match manager.next_occurrence_after(&rule, anchor, after)? {
        Some(next) => println!("{}", next.format(&config.date_format)),
        None => println!("{}", "No further occurrences.".dimmed()),
    }
    Ok(())
}
