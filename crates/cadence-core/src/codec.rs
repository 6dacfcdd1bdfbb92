//! RFC 5545 `RRULE` text codec.
//!
//! [`parse`] accepts the `KEY=VALUE;KEY=VALUE` grammar, with or without a
//! leading `RRULE:`; keys and values are case-insensitive. [`serialize`]
//! produces a canonical form: parts in a fixed order, by-field values sorted,
//! `INTERVAL` omitted when 1 and `WKST` omitted when Monday. The canonical
//! form need not match the caller's original text, only its value:
//! `parse(&serialize(&r)) == Ok(r)` for every constructible rule.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Weekday};

use crate::error::ParseError;
use crate::rule::{Frequency, RuleBuilder, RuleDescriptor, Terminator, Until, WeekdayNum};

const DATE_FORMAT: &str = "%Y%m%d";
const DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Parses RRULE text into a [`RuleDescriptor`].
pub fn parse(text: &str) -> Result<RuleDescriptor, ParseError> {
    let trimmed = text.trim();
    let body = match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &trimmed[6..],
        _ => trimmed,
    };
    if body.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut seen = HashSet::new();
    let mut frequency = None;
    let mut interval = None;
    let mut count = None;
    let mut until = None;
    let mut by_week_days = Vec::new();
    let mut by_month_days = Vec::new();
    let mut by_months = Vec::new();
    let mut by_set_positions = Vec::new();
    let mut by_year_days = Vec::new();
    let mut by_week_numbers = Vec::new();
    let mut week_start = None;

    for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| ParseError::MalformedPart(part.to_string()))?;
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim().to_ascii_uppercase();
        if key.is_empty() || value.is_empty() {
            return Err(ParseError::MalformedPart(part.to_string()));
        }
        if !seen.insert(key.clone()) {
            return Err(ParseError::DuplicateKey(key));
        }

        match key.as_str() {
            "FREQ" => frequency = Some(parse_frequency(&value)?),
            "INTERVAL" => interval = Some(parse_number::<u32>("INTERVAL", &value)?),
            "COUNT" => count = Some(parse_number::<u32>("COUNT", &value)?),
            "UNTIL" => until = Some(parse_until(&value)?),
            "BYDAY" => by_week_days = parse_list(&value, parse_weekday_num)?,
            "BYMONTHDAY" => {
                by_month_days = parse_list(&value, |v| parse_number::<i8>("BYMONTHDAY", v))?
            }
            "BYMONTH" => by_months = parse_list(&value, |v| parse_number::<u8>("BYMONTH", v))?,
            "BYSETPOS" => {
                by_set_positions = parse_list(&value, |v| parse_number::<i16>("BYSETPOS", v))?
            }
            "BYYEARDAY" => {
                by_year_days = parse_list(&value, |v| parse_number::<i16>("BYYEARDAY", v))?
            }
            "BYWEEKNO" => {
                by_week_numbers = parse_list(&value, |v| parse_number::<i8>("BYWEEKNO", v))?
            }
            "WKST" => {
                week_start = Some(weekday_from_code(&value).ok_or(ParseError::InvalidValue {
                    key: "WKST",
                    value: value.clone(),
                })?)
            }
            _ => return Err(ParseError::UnknownKey(key)),
        }
    }

    let frequency = frequency.ok_or(ParseError::MissingFrequency)?;
    let mut builder = RuleBuilder::new(frequency)
        .by_week_days(by_week_days)
        .by_month_days(by_month_days)
        .by_months(by_months)
        .by_set_positions(by_set_positions)
        .by_year_days(by_year_days)
        .by_week_numbers(by_week_numbers);
    if let Some(interval) = interval {
        builder = builder.interval(interval);
    }
    if let Some(count) = count {
        builder = builder.count(count);
    }
    if let Some(until) = until {
        builder = builder.until(until);
    }
    if let Some(week_start) = week_start {
        builder = builder.week_start(week_start);
    }

    Ok(builder.build()?)
}

/// Serializes a rule to canonical RRULE text, without the `RRULE:` prefix.
pub fn serialize(rule: &RuleDescriptor) -> String {
    let mut parts = vec![format!("FREQ={}", rule.frequency())];

    if rule.interval() != 1 {
        parts.push(format!("INTERVAL={}", rule.interval()));
    }
    match rule.terminator() {
        Terminator::Never => {}
        Terminator::AfterCount(n) => parts.push(format!("COUNT={}", n)),
        Terminator::Until(until) => parts.push(format!("UNTIL={}", format_until(&until))),
    }
    push_list(&mut parts, "BYMONTH", rule.by_months());
    push_list(&mut parts, "BYWEEKNO", rule.by_week_numbers());
    push_list(&mut parts, "BYYEARDAY", rule.by_year_days());
    push_list(&mut parts, "BYMONTHDAY", rule.by_month_days());
    push_list(&mut parts, "BYDAY", rule.by_week_days());
    push_list(&mut parts, "BYSETPOS", rule.by_set_positions());
    if rule.week_start() != Weekday::Mon {
        parts.push(format!("WKST={}", weekday_code(rule.week_start())));
    }

    parts.join(";")
}

impl RuleDescriptor {
    /// The rule as a full `RRULE:` content line.
    pub fn to_rrule_line(&self) -> String {
        format!("RRULE:{}", serialize(self))
    }
}

impl FromStr for RuleDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{}", n)?;
        }
        f.write_str(weekday_code(self.weekday))
    }
}

/// The two-letter RFC 5545 code for a weekday.
pub fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

pub fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

pub(crate) fn format_until(until: &Until) -> String {
    match until {
        Until::Date(date) => date.format(DATE_FORMAT).to_string(),
        Until::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
    }
}

fn parse_frequency(value: &str) -> Result<Frequency, ParseError> {
    match value {
        "DAILY" => Ok(Frequency::Daily),
        "WEEKLY" => Ok(Frequency::Weekly),
        "MONTHLY" => Ok(Frequency::Monthly),
        "YEARLY" => Ok(Frequency::Yearly),
        "SECONDLY" | "MINUTELY" | "HOURLY" => {
            Err(ParseError::UnsupportedFrequency(value.to_string()))
        }
        _ => Err(ParseError::UnknownFrequency(value.to_string())),
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_list<T, F>(value: &str, parse_item: F) -> Result<Vec<T>, ParseError>
where
    F: Fn(&str) -> Result<T, ParseError>,
{
    value.split(',').map(|item| parse_item(item.trim())).collect()
}

fn parse_weekday_num(token: &str) -> Result<WeekdayNum, ParseError> {
    let invalid = || ParseError::InvalidValue {
        key: "BYDAY",
        value: token.to_string(),
    };
    if token.len() < 2 || !token.is_ascii() {
        return Err(invalid());
    }

    let (prefix, code) = token.split_at(token.len() - 2);
    let weekday = weekday_from_code(code).ok_or_else(invalid)?;
    if prefix.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal = prefix.parse::<i8>().map_err(|_| invalid())?;
    Ok(WeekdayNum::nth(ordinal, weekday))
}

fn parse_until(value: &str) -> Result<Until, ParseError> {
    let invalid = || ParseError::InvalidValue {
        key: "UNTIL",
        value: value.to_string(),
    };
    // Times are naive wall-clock values, so a UTC designator carries no extra meaning.
    let stripped = value.strip_suffix('Z').unwrap_or(value);

    if stripped.contains('T') {
        NaiveDateTime::parse_from_str(stripped, DATETIME_FORMAT)
            .map(Until::DateTime)
            .map_err(|_| invalid())
    } else if stripped.len() == 8 {
        NaiveDate::parse_from_str(stripped, DATE_FORMAT)
            .map(Until::Date)
            .map_err(|_| invalid())
    } else {
        Err(invalid())
    }
}

fn push_list<T: fmt::Display>(parts: &mut Vec<String>, key: &str, values: &BTreeSet<T>) {
    if values.is_empty() {
        return;
    }
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    parts.push(format!("{}={}", key, joined));
}
