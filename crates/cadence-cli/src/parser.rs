use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_english::{parse_date_string, Dialect};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

/// Parses a wall-clock date-time. ISO forms first, then natural language
/// ("tomorrow 9am", "next friday") relative to the local clock. A bare date
/// means midnight.
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    parse_date_string(input, Local::now(), Dialect::Us)
        .map(|dt| dt.naive_local())
        .map_err(|e| anyhow::anyhow!("Failed to parse date '{}': {}", input, e))
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }
    parse_datetime(input).map(|dt| dt.date())
}
