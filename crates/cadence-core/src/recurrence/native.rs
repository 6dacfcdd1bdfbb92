//! The crate's own candidate generator.
//!
//! A rule is expanded period by period. Periods are stepped from the anchor
//! by `interval` units of the rule's frequency; every day of a period is
//! run through the BY* filters, BYSETPOS then picks from the survivors, and
//! each selected day takes the anchor's time of day.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use tracing::trace;

use super::{OccurrenceGenerator, TimeWindow};
use crate::error::CoreError;
use crate::rule::{Frequency, RuleDescriptor, WeekdayNum};

/// Native RFC 5545 expansion for DAILY, WEEKLY, MONTHLY and YEARLY rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl OccurrenceGenerator for NativeEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    fn generate(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
        limit: usize,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let mut occurrences = Vec::new();
        if limit == 0 || window.is_empty() || window.end <= anchor {
            return Ok(occurrences);
        }

        let plan = ExpansionPlan::new(rule, anchor);
        let until = rule.until().map(|until| until.as_datetime());
        let count = rule.count();
        let mut counted = 0u32;
        let time = anchor.time();
        let last_date = window.end.date();

        // COUNT has to be walked from the anchor; without it we may jump
        // straight to the period holding the window start.
        let mut index = match count {
            Some(_) => 0,
            None => plan.seek_index(window.start.date()),
        };

        while let Some(period) = plan.period(index) {
            let Some(&first) = period.first() else {
                break;
            };
            if first > last_date {
                break;
            }

            let selected = plan.select(period);
            trace!(index, %first, selected = selected.len(), "Expanded period");

            for day in selected {
                let occurrence = day.and_time(time);
                if occurrence < anchor {
                    continue;
                }
                if until.is_some_and(|until| occurrence > until) {
                    return Ok(occurrences);
                }
                if let Some(count) = count {
                    if counted >= count {
                        return Ok(occurrences);
                    }
                    counted += 1;
                }
                if occurrence >= window.end {
                    return Ok(occurrences);
                }
                if occurrence >= window.start {
                    occurrences.push(occurrence);
                    if occurrences.len() >= limit {
                        return Ok(occurrences);
                    }
                }
            }

            index += 1;
        }

        Ok(occurrences)
    }
}

/// A rule resolved against its anchor: by-field defaults filled in and the
/// first period located.
struct ExpansionPlan<'a> {
    rule: &'a RuleDescriptor,
    anchor: NaiveDate,
    week_origin: NaiveDate,
    by_week_days: BTreeSet<WeekdayNum>,
    by_month_days: BTreeSet<i8>,
    by_months: BTreeSet<u8>,
}

impl<'a> ExpansionPlan<'a> {
    fn new(rule: &'a RuleDescriptor, anchor: NaiveDateTime) -> Self {
        let anchor = anchor.date();
        let mut by_week_days = rule.by_week_days().clone();
        let mut by_month_days = rule.by_month_days().clone();
        let mut by_months = rule.by_months().clone();

        // With no day-level filter the anchor supplies the day, the same way
        // DTSTART does for a bare FREQ=MONTHLY or FREQ=YEARLY.
        let no_day_filter = by_week_days.is_empty()
            && by_month_days.is_empty()
            && rule.by_year_days().is_empty()
            && rule.by_week_numbers().is_empty();
        if no_day_filter {
            match rule.frequency() {
                Frequency::Daily => {}
                Frequency::Weekly => {
                    by_week_days.insert(WeekdayNum::every(anchor.weekday()));
                }
                Frequency::Monthly => {
                    by_month_days.insert(anchor.day() as i8);
                }
                Frequency::Yearly => {
                    if by_months.is_empty() {
                        by_months.insert(anchor.month() as u8);
                    }
                    by_month_days.insert(anchor.day() as i8);
                }
            }
        }

        let into_week = u64::from(days_since(anchor.weekday(), rule.week_start()));
        let week_origin = anchor.checked_sub_days(Days::new(into_week)).unwrap_or(anchor);

        Self {
            rule,
            anchor,
            week_origin,
            by_week_days,
            by_month_days,
            by_months,
        }
    }

    /// The days of the `index`-th period, or `None` past the calendar's range.
    fn period(&self, index: u64) -> Option<Vec<NaiveDate>> {
        let step = index.checked_mul(u64::from(self.rule.interval()))?;
        match self.rule.frequency() {
            Frequency::Daily => Some(vec![self.anchor.checked_add_days(Days::new(step))?]),
            Frequency::Weekly => {
                let start = self
                    .week_origin
                    .checked_add_days(Days::new(step.checked_mul(7)?))?;
                let days: Vec<NaiveDate> = start.iter_days().take(7).collect();
                (days.len() == 7).then_some(days)
            }
            Frequency::Monthly => {
                let total = month_index(self.anchor).checked_add(i64::try_from(step).ok()?)?;
                let year = i32::try_from(total.div_euclid(12)).ok()?;
                let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let len = days_in_month(year, month)?;
                Some(first.iter_days().take(len as usize).collect())
            }
            Frequency::Yearly => {
                let year = self.anchor.year().checked_add(i32::try_from(step).ok()?)?;
                let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
                Some(first.iter_days().take(days_in_year(year) as usize).collect())
            }
        }
    }

    /// Index of the period at or just before `target`. Only valid when the
    /// rule has no COUNT.
    fn seek_index(&self, target: NaiveDate) -> u64 {
        let periods = match self.rule.frequency() {
            Frequency::Daily => (target - self.anchor).num_days(),
            Frequency::Weekly => (target - self.week_origin).num_days() / 7,
            Frequency::Monthly => month_index(target) - month_index(self.anchor),
            Frequency::Yearly => i64::from(target.year()) - i64::from(self.anchor.year()),
        };
        let index = periods / i64::from(self.rule.interval());
        u64::try_from(index).unwrap_or(0).saturating_sub(1)
    }

    /// Applies the BY* filters, then BYSETPOS, to one period.
    fn select(&self, period: Vec<NaiveDate>) -> Vec<NaiveDate> {
        let matched: Vec<NaiveDate> = period.into_iter().filter(|day| self.matches(*day)).collect();
        let positions = self.rule.by_set_positions();
        if positions.is_empty() {
            return matched;
        }

        let len = matched.len() as i32;
        let mut picked: Vec<NaiveDate> = positions
            .iter()
            .filter_map(|&position| resolve(i32::from(position), len))
            .filter_map(|position| matched.get(usize::try_from(position - 1).ok()?).copied())
            .collect();
        picked.sort_unstable();
        picked.dedup();
        picked
    }

    fn matches(&self, day: NaiveDate) -> bool {
        if !self.by_months.is_empty() && !self.by_months.contains(&(day.month() as u8)) {
            return false;
        }

        let week_numbers = self.rule.by_week_numbers();
        if !week_numbers.is_empty() && !self.matches_week_number(day) {
            return false;
        }

        let year_days = self.rule.by_year_days();
        if !year_days.is_empty() {
            let len = days_in_year(day.year()) as i32;
            let ordinal = day.ordinal() as i32;
            if !year_days
                .iter()
                .any(|&n| resolve(i32::from(n), len) == Some(ordinal))
            {
                return false;
            }
        }

        if !self.by_month_days.is_empty() {
            let len = days_in_month(day.year(), day.month()).unwrap_or(31) as i32;
            let day_of_month = day.day() as i32;
            if !self
                .by_month_days
                .iter()
                .any(|&n| resolve(i32::from(n), len) == Some(day_of_month))
            {
                return false;
            }
        }

        if !self.by_week_days.is_empty()
            && !self
                .by_week_days
                .iter()
                .any(|entry| self.matches_weekday(*entry, day))
        {
            return false;
        }

        true
    }

    fn matches_weekday(&self, entry: WeekdayNum, day: NaiveDate) -> bool {
        if entry.weekday != day.weekday() {
            return false;
        }
        let Some(ordinal) = entry.ordinal else {
            return true;
        };

        // An nth qualifier counts within the month for MONTHLY rules (and
        // YEARLY rules narrowed by BYMONTH), within the year otherwise.
        // DAILY and WEEKLY rules cannot carry one.
        let (position, len) = match self.rule.frequency() {
            Frequency::Daily | Frequency::Weekly => return true,
            Frequency::Monthly => (day.day0(), month_len(day)),
            Frequency::Yearly if !self.by_months.is_empty() => (day.day0(), month_len(day)),
            Frequency::Yearly => (day.ordinal0(), days_in_year(day.year())),
        };

        let ordinal = i32::from(ordinal);
        if ordinal > 0 {
            ordinal == (position / 7 + 1) as i32
        } else {
            ordinal == -(((len - 1 - position) / 7 + 1) as i32)
        }
    }

    fn matches_week_number(&self, day: NaiveDate) -> bool {
        let Some((week, weeks_in_year)) = week_number(day, self.rule.week_start()) else {
            return false;
        };
        self.rule.by_week_numbers().iter().any(|&n| {
            let n = i32::from(n);
            if n > 0 {
                n == week
            } else {
                n == week - weeks_in_year - 1
            }
        })
    }
}

/// Resolves a signed 1-based position against a sequence of `len` items.
fn resolve(n: i32, len: i32) -> Option<i32> {
    if n > 0 && n <= len {
        Some(n)
    } else if n < 0 && -n <= len {
        Some(len + 1 + n)
    } else {
        None
    }
}

fn days_since(day: Weekday, week_start: Weekday) -> u32 {
    (7 + day.num_days_from_monday() - week_start.num_days_from_monday()) % 7
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

fn month_len(day: NaiveDate) -> u32 {
    days_in_month(day.year(), day.month()).unwrap_or(31)
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// First day of week 1: the first `week_start`-based week with at least
/// four days in `year`.
fn week_one_start(year: i32, week_start: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = days_since(week_start, jan1.weekday());
    if offset >= 4 {
        jan1.checked_sub_days(Days::new(u64::from(7 - offset)))
    } else {
        jan1.checked_add_days(Days::new(u64::from(offset)))
    }
}

/// Week number of `day` and the number of weeks in the week-year it
/// belongs to. Days at either edge of a calendar year may fall into the
/// neighbouring week-year.
fn week_number(day: NaiveDate, week_start: Weekday) -> Option<(i32, i32)> {
    let year = day.year();
    let this_year = week_one_start(year, week_start)?;
    let (week_year, origin) = if day < this_year {
        (year - 1, week_one_start(year - 1, week_start)?)
    } else {
        let next_year = week_one_start(year + 1, week_start)?;
        if day >= next_year {
            (year + 1, next_year)
        } else {
            (year, this_year)
        }
    };

    let following = week_one_start(week_year + 1, week_start)?;
    let week = i32::try_from((day - origin).num_days() / 7 + 1).ok()?;
    let weeks = i32::try_from((following - origin).num_days() / 7).ok()?;
    Some((week, weeks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn expand(
        rule: &str,
        anchor: NaiveDateTime,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        let rule: RuleDescriptor = rule.parse().unwrap();
        NativeEngine
            .generate(&rule, anchor, TimeWindow::new(start, end).unwrap(), 10_000)
            .unwrap()
    }

    fn dates(occurrences: &[NaiveDateTime]) -> Vec<NaiveDate> {
        occurrences.iter().map(|dt| dt.date()).collect()
    }

    mod frequency_tests {
        use super::*;

        #[test]
        fn test_daily_week() {
            let result = expand(
                "FREQ=DAILY",
                at(2024, 1, 1, 0),
                at(2024, 1, 1, 0),
                at(2024, 1, 8, 0),
            );
            assert_eq!(result.len(), 7);
            assert_eq!(result[0], at(2024, 1, 1, 0));
            assert_eq!(result[6], at(2024, 1, 7, 0));
        }

        #[test]
        fn test_biweekly_tuesday_thursday() {
            // 2024-01-02 is a Tuesday
            let result = expand(
                "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH",
                at(2024, 1, 2, 10),
                at(2024, 1, 1, 0),
                at(2024, 2, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![
                    date(2024, 1, 2),
                    date(2024, 1, 4),
                    date(2024, 1, 16),
                    date(2024, 1, 18),
                    date(2024, 1, 30),
                ]
            );
            assert!(result.iter().all(|dt| matches!(dt.weekday(), Tue | Thu)));
        }

        #[test]
        fn test_monthly_last_day() {
            let result = expand(
                "FREQ=MONTHLY;BYMONTHDAY=-1",
                at(2024, 1, 31, 9),
                at(2024, 1, 1, 0),
                at(2024, 5, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
            );
        }

        #[test]
        fn test_monthly_default_skips_short_months() {
            let result = expand(
                "FREQ=MONTHLY",
                at(2024, 1, 31, 9),
                at(2024, 1, 1, 0),
                at(2024, 6, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 31), date(2024, 3, 31), date(2024, 5, 31)]
            );
        }

        #[test]
        fn test_yearly_default_uses_anchor_day() {
            let result = expand(
                "FREQ=YEARLY",
                at(2020, 2, 29, 0),
                at(2020, 1, 1, 0),
                at(2029, 1, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2020, 2, 29), date(2024, 2, 29), date(2028, 2, 29)]
            );
        }
    }

    mod by_rule_tests {
        use super::*;

        #[test]
        fn test_second_monday_of_month() {
            let result = expand(
                "FREQ=MONTHLY;BYDAY=2MO",
                at(2024, 1, 8, 9),
                at(2024, 1, 1, 0),
                at(2024, 4, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 8), date(2024, 2, 12), date(2024, 3, 11)]
            );
        }

        #[test]
        fn test_last_friday_of_month() {
            let result = expand(
                "FREQ=MONTHLY;BYDAY=-1FR",
                at(2024, 1, 26, 17),
                at(2024, 1, 1, 0),
                at(2024, 4, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 26), date(2024, 2, 23), date(2024, 3, 29)]
            );
        }

        #[test]
        fn test_last_weekday_with_setpos() {
            let result = expand(
                "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
                at(2024, 1, 31, 9),
                at(2024, 1, 1, 0),
                at(2024, 4, 1, 0),
            );
            // March 2024 ends on a Sunday
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]
            );
        }

        #[test]
        fn test_thanksgiving() {
            let result = expand(
                "FREQ=YEARLY;BYMONTH=11;BYDAY=4TH",
                at(2023, 11, 23, 12),
                at(2023, 1, 1, 0),
                at(2026, 1, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2023, 11, 23), date(2024, 11, 28), date(2025, 11, 27)]
            );
        }

        #[test]
        fn test_year_day() {
            let result = expand(
                "FREQ=YEARLY;BYYEARDAY=1,-1",
                at(2024, 1, 1, 0),
                at(2024, 1, 1, 0),
                at(2025, 6, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 1), date(2024, 12, 31), date(2025, 1, 1)]
            );
        }

        #[test]
        fn test_week_number_monday_start() {
            // ISO week 1 of 2024 begins Monday 2024-01-01; week 1 of 2025 and
            // 2026 begin in the preceding December
            let result = expand(
                "FREQ=YEARLY;BYWEEKNO=1;BYDAY=MO",
                at(2024, 1, 1, 0),
                at(2024, 1, 1, 0),
                at(2026, 1, 1, 0),
            );
            assert_eq!(
                dates(&result),
                vec![date(2024, 1, 1), date(2024, 12, 30), date(2025, 12, 29)]
            );
        }

        #[test]
        fn test_daily_limited_by_month() {
            let result = expand(
                "FREQ=DAILY;BYMONTH=2",
                at(2024, 1, 30, 8),
                at(2024, 1, 1, 0),
                at(2024, 2, 3, 0),
            );
            assert_eq!(dates(&result), vec![date(2024, 2, 1), date(2024, 2, 2)]);
        }
    }

    mod window_tests {
        use super::*;

        #[test]
        fn test_count_walked_from_anchor() {
            let result = expand(
                "FREQ=DAILY;COUNT=5",
                at(2024, 1, 1, 0),
                at(2024, 1, 10, 0),
                at(2024, 2, 1, 0),
            );
            assert!(result.is_empty());
        }

        #[test]
        fn test_seek_far_window() {
            let result = expand(
                "FREQ=WEEKLY;INTERVAL=3",
                at(2000, 1, 3, 9),
                at(2024, 1, 1, 0),
                at(2024, 2, 1, 0),
            );
            assert!(!result.is_empty());
            for dt in &result {
                let weeks = (dt.date() - date(2000, 1, 3)).num_days() / 7;
                assert_eq!(weeks % 3, 0);
                assert_eq!(dt.weekday(), Mon);
            }
        }

        #[test]
        fn test_anchor_not_matching_rule_is_skipped() {
            // 2024-01-01 is a Monday; the rule only allows Wednesdays
            let result = expand(
                "FREQ=WEEKLY;BYDAY=WE",
                at(2024, 1, 1, 9),
                at(2024, 1, 1, 0),
                at(2024, 1, 11, 0),
            );
            assert_eq!(dates(&result), vec![date(2024, 1, 3), date(2024, 1, 10)]);
        }

        #[test]
        fn test_limit() {
            let rule: RuleDescriptor = "FREQ=DAILY".parse().unwrap();
            let window = TimeWindow::new(at(2024, 1, 1, 0), at(2025, 1, 1, 0)).unwrap();
            let result = NativeEngine.generate(&rule, at(2024, 1, 1, 0), window, 4).unwrap();
            assert_eq!(result.len(), 4);
        }
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn test_week_one_start() {
            assert_eq!(week_one_start(2024, Mon), Some(date(2024, 1, 1)));
            assert_eq!(week_one_start(2021, Mon), Some(date(2021, 1, 4)));
            assert_eq!(week_one_start(2026, Mon), Some(date(2025, 12, 29)));
        }

        #[test]
        fn test_week_number_matches_iso() {
            for day in date(2019, 12, 1).iter_days().take(3 * 366) {
                let iso = day.iso_week();
                let (week, _) = week_number(day, Mon).unwrap();
                assert_eq!(week as u32, iso.week(), "{day}");
            }
        }

        #[test]
        fn test_resolve() {
            assert_eq!(resolve(1, 5), Some(1));
            assert_eq!(resolve(-1, 5), Some(5));
            assert_eq!(resolve(6, 5), None);
            assert_eq!(resolve(-6, 5), None);
        }
    }
}
