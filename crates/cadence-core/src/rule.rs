//! The immutable recurrence rule value object.
//!
//! A [`RuleDescriptor`] holds everything an RFC 5545 `RRULE` can express for
//! daily-or-coarser frequencies. It is constructed through [`RuleBuilder`]
//! (or parsed from text, see [`crate::codec`]) and is never mutated
//! afterwards.
//!
//! ## Equality contract
//!
//! The BY* filter fields are sets: their order carries no meaning. They are
//! stored in `BTreeSet`s, so `==` and `Hash` compare them as sets and
//! duplicate values collapse. Two rules built from `BYDAY=TU,TH` and
//! `BYDAY=TH,TU,TU` are equal.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_rrule_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_rrule_str())
    }
}

/// The UNTIL bound of a rule.
///
/// Both forms are inclusive of the whole calendar day they name: an
/// occurrence is kept when its date is not after [`Until::last_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Until {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Until {
    /// The last calendar day on which an occurrence may fall.
    pub fn last_day(&self) -> NaiveDate {
        match self {
            Until::Date(date) => *date,
            Until::DateTime(dt) => dt.date(),
        }
    }

    /// The bound as a date-time; a bare date maps to the last second of that day.
    pub fn as_datetime(&self) -> NaiveDateTime {
        match self {
            Until::Date(date) => date.and_time(last_second_of_day()),
            Until::DateTime(dt) => *dt,
        }
    }
}

fn last_second_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

impl From<NaiveDate> for Until {
    fn from(date: NaiveDate) -> Self {
        Until::Date(date)
    }
}

impl From<NaiveDateTime> for Until {
    fn from(dt: NaiveDateTime) -> Self {
        Until::DateTime(dt)
    }
}

/// How a series ends. COUNT and UNTIL cannot both be present by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Terminator {
    #[default]
    Never,
    AfterCount(u32),
    Until(Until),
}

/// A BYDAY entry: a weekday with an optional nth-occurrence qualifier.
///
/// `ordinal = Some(1)` is the first such weekday in the period, `Some(-1)` the
/// last. The qualifier only has meaning for MONTHLY and YEARLY periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub weekday: Weekday,
    pub ordinal: Option<i8>,
}

impl WeekdayNum {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            weekday,
            ordinal: None,
        }
    }

    pub fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            weekday,
            ordinal: Some(ordinal),
        }
    }

    fn sort_key(&self) -> (u32, i16) {
        (
            self.weekday.num_days_from_monday(),
            self.ordinal.map(i16::from).unwrap_or(i16::MIN),
        )
    }
}

impl PartialOrd for WeekdayNum {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeekdayNum {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// An immutable RFC 5545 recurrence rule restricted to DAILY..YEARLY.
///
/// Serializes to and from its RRULE text (see [`crate::codec`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct RuleDescriptor {
    frequency: Frequency,
    interval: u32,
    terminator: Terminator,
    by_week_days: BTreeSet<WeekdayNum>,
    by_month_days: BTreeSet<i8>,
    by_months: BTreeSet<u8>,
    by_set_positions: BTreeSet<i16>,
    by_year_days: BTreeSet<i16>,
    by_week_numbers: BTreeSet<i8>,
    week_start: Weekday,
}

impl RuleDescriptor {
    pub fn builder(frequency: Frequency) -> RuleBuilder {
        RuleBuilder::new(frequency)
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    pub fn count(&self) -> Option<u32> {
        match self.terminator {
            Terminator::AfterCount(n) => Some(n),
            _ => None,
        }
    }

    pub fn until(&self) -> Option<Until> {
        match self.terminator {
            Terminator::Until(until) => Some(until),
            _ => None,
        }
    }

    pub fn by_week_days(&self) -> &BTreeSet<WeekdayNum> {
        &self.by_week_days
    }

    pub fn by_month_days(&self) -> &BTreeSet<i8> {
        &self.by_month_days
    }

    pub fn by_months(&self) -> &BTreeSet<u8> {
        &self.by_months
    }

    pub fn by_set_positions(&self) -> &BTreeSet<i16> {
        &self.by_set_positions
    }

    pub fn by_year_days(&self) -> &BTreeSet<i16> {
        &self.by_year_days
    }

    pub fn by_week_numbers(&self) -> &BTreeSet<i8> {
        &self.by_week_numbers
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Whether the series ends, either by COUNT or by UNTIL.
    pub fn is_finite(&self) -> bool {
        !matches!(self.terminator, Terminator::Never)
    }

    /// A copy of this rule with a different terminator, validated the same
    /// way [`RuleBuilder::build`] validates COUNT and UNTIL.
    pub fn with_terminator(&self, terminator: Terminator) -> Result<RuleDescriptor, RuleError> {
        let terminator = match terminator {
            Terminator::Never => Terminator::Never,
            Terminator::AfterCount(0) => return Err(RuleError::ZeroCount),
            Terminator::AfterCount(n) => Terminator::AfterCount(n),
            Terminator::Until(until) => Terminator::Until(normalize_until(until)?),
        };
        Ok(RuleDescriptor {
            terminator,
            ..self.clone()
        })
    }

    /// A copy of this rule that never ends.
    pub fn without_terminator(&self) -> RuleDescriptor {
        RuleDescriptor {
            terminator: Terminator::Never,
            ..self.clone()
        }
    }
}

/// Builder for [`RuleDescriptor`]; all validation happens in [`RuleBuilder::build`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    frequency: Frequency,
    interval: u32,
    count: Option<u32>,
    until: Option<Until>,
    by_week_days: BTreeSet<WeekdayNum>,
    by_month_days: BTreeSet<i8>,
    by_months: BTreeSet<u8>,
    by_set_positions: BTreeSet<i16>,
    by_year_days: BTreeSet<i16>,
    by_week_numbers: BTreeSet<i8>,
    week_start: Weekday,
}

impl RuleBuilder {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
            by_week_days: BTreeSet::new(),
            by_month_days: BTreeSet::new(),
            by_months: BTreeSet::new(),
            by_set_positions: BTreeSet::new(),
            by_year_days: BTreeSet::new(),
            by_week_numbers: BTreeSet::new(),
            week_start: Weekday::Mon,
        }
    }

    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn until(mut self, until: impl Into<Until>) -> Self {
        self.until = Some(until.into());
        self
    }

    pub fn by_week_days(mut self, days: impl IntoIterator<Item = WeekdayNum>) -> Self {
        self.by_week_days.extend(days);
        self
    }

    pub fn by_month_days(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.by_month_days.extend(days);
        self
    }

    pub fn by_months(mut self, months: impl IntoIterator<Item = u8>) -> Self {
        self.by_months.extend(months);
        self
    }

    pub fn by_set_positions(mut self, positions: impl IntoIterator<Item = i16>) -> Self {
        self.by_set_positions.extend(positions);
        self
    }

    pub fn by_year_days(mut self, days: impl IntoIterator<Item = i16>) -> Self {
        self.by_year_days.extend(days);
        self
    }

    pub fn by_week_numbers(mut self, weeks: impl IntoIterator<Item = i8>) -> Self {
        self.by_week_numbers.extend(weeks);
        self
    }

    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn build(self) -> Result<RuleDescriptor, RuleError> {
        if self.interval < 1 {
            return Err(RuleError::InvalidInterval(self.interval));
        }

        let terminator = match (self.count, self.until) {
            (Some(_), Some(_)) => return Err(RuleError::CountAndUntil),
            (Some(0), None) => return Err(RuleError::ZeroCount),
            (Some(n), None) => Terminator::AfterCount(n),
            (None, Some(until)) => Terminator::Until(normalize_until(until)?),
            (None, None) => Terminator::Never,
        };

        if self.frequency != Frequency::Yearly {
            if !self.by_year_days.is_empty() {
                return Err(RuleError::YearlyOnlyField {
                    field: "BYYEARDAY",
                    frequency: self.frequency,
                });
            }
            if !self.by_week_numbers.is_empty() {
                return Err(RuleError::YearlyOnlyField {
                    field: "BYWEEKNO",
                    frequency: self.frequency,
                });
            }
        }

        for day in &self.by_week_days {
            if let Some(n) = day.ordinal {
                check_signed("BYDAY", i32::from(n), 53)?;
                match self.frequency {
                    Frequency::Daily | Frequency::Weekly => {
                        return Err(RuleError::OrdinalWeekday(self.frequency));
                    }
                    Frequency::Yearly if !self.by_week_numbers.is_empty() => {
                        return Err(RuleError::OrdinalWithWeekNumber);
                    }
                    _ => {}
                }
            }
        }
        if self.frequency == Frequency::Weekly && !self.by_month_days.is_empty() {
            return Err(RuleError::MonthDayOnWeekly);
        }
        for &day in &self.by_month_days {
            check_signed("BYMONTHDAY", i32::from(day), 31)?;
        }
        for &month in &self.by_months {
            if !(1..=12).contains(&month) {
                return Err(RuleError::OutOfRange {
                    field: "BYMONTH",
                    value: i32::from(month),
                });
            }
        }
        for &pos in &self.by_set_positions {
            check_signed("BYSETPOS", i32::from(pos), 366)?;
        }
        for &day in &self.by_year_days {
            check_signed("BYYEARDAY", i32::from(day), 366)?;
        }
        for &week in &self.by_week_numbers {
            check_signed("BYWEEKNO", i32::from(week), 53)?;
        }

        Ok(RuleDescriptor {
            frequency: self.frequency,
            interval: self.interval,
            terminator,
            by_week_days: self.by_week_days,
            by_month_days: self.by_month_days,
            by_months: self.by_months,
            by_set_positions: self.by_set_positions,
            by_year_days: self.by_year_days,
            by_week_numbers: self.by_week_numbers,
            week_start: self.week_start,
        })
    }
}

/// UNTIL is stored at whole-second precision with a four-digit year, the
/// range its RRULE text form can carry.
fn normalize_until(until: Until) -> Result<Until, RuleError> {
    let year = until.last_day().year();
    if !(0..=9999).contains(&year) {
        return Err(RuleError::OutOfRange {
            field: "UNTIL",
            value: year,
        });
    }
    Ok(match until {
        Until::DateTime(dt) => Until::DateTime(dt.with_nanosecond(0).unwrap_or(dt)),
        date => date,
    })
}

/// Signed by-field values are valid in `-max..=-1` and `1..=max`.
fn check_signed(field: &'static str, value: i32, max: i32) -> Result<(), RuleError> {
    if value == 0 || value.abs() > max {
        return Err(RuleError::OutOfRange { field, value });
    }
    Ok(())
}
