//! Region occurrence adapter.
//!
//! Answers "is this region present on that date, and where" for one-off and
//! recurring regions. Recurring regions are expanded through the shared
//! [`RecurrenceManager`], so COUNT and UNTIL behave identically for
//! [`TimeRegion`] and [`DayRegion`].
//!
//! A region whose rule fails to parse or expand is reported as absent, and
//! the failure is logged at `warn`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{DayRegion, Patch, TimeRegion, TimeRegionPatch};
use crate::recurrence::{default_manager, RecurrenceManager, TimeWindow};
use crate::rule::RuleDescriptor;

/// Half-open containment: `start <= instant < end`.
#[inline]
pub fn contains(start: NaiveDateTime, end: NaiveDateTime, instant: NaiveDateTime) -> bool {
    start <= instant && instant < end
}

/// Interval overlap: `start < range_end && end > range_start`.
#[inline]
pub fn overlaps(
    start: NaiveDateTime,
    end: NaiveDateTime,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> bool {
    start < range_end && end > range_start
}

/// Parses a region's recurrence text. Blank text means "not recurring".
pub(crate) fn recurrence_of(text: Option<&str>) -> Option<Result<RuleDescriptor, CoreError>> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.parse::<RuleDescriptor>().map_err(CoreError::from))
}

/// Whether a rule anchored at `anchor` has an occurrence inside `window`.
///
/// Failures are logged against `region_id` and count as "no occurrence".
fn first_occurrence(
    manager: &RecurrenceManager,
    region_id: Uuid,
    rule: Result<RuleDescriptor, CoreError>,
    anchor: NaiveDateTime,
    window: TimeWindow,
) -> Option<NaiveDateTime> {
    let found = rule.and_then(|rule| manager.occurrences_in(&rule, anchor, window));
    match found {
        Ok(occurrences) => occurrences.into_iter().next(),
        Err(e) => {
            warn!(%region_id, error = %e, "Ignoring region with unusable recurrence rule");
            None
        }
    }
}

impl TimeRegion {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        contains(self.start, self.end, instant)
    }

    pub fn overlaps(&self, range_start: NaiveDateTime, range_end: NaiveDateTime) -> bool {
        overlaps(self.start, self.end, range_start, range_end)
    }

    /// The concrete region on `date`, using the default manager.
    pub fn expanded_for_date(&self, date: NaiveDate) -> Option<TimeRegion> {
        self.expanded_for_date_with(date, default_manager())
    }

    /// The concrete region on `date`, if the region occurs that day.
    ///
    /// A one-off region matches only on its own start date and is returned
    /// unchanged. A recurring region is anchored at its start; the returned
    /// copy starts at the occurrence, keeps the original duration, and has
    /// its recurrence rule cleared.
    pub fn expanded_for_date_with(
        &self,
        date: NaiveDate,
        manager: &RecurrenceManager,
    ) -> Option<TimeRegion> {
        let Some(rule) = recurrence_of(self.recurrence_rule.as_deref()) else {
            return (self.start.date() == date).then(|| self.clone());
        };

        let occurrence = first_occurrence(
            manager,
            self.id,
            rule,
            self.start,
            TimeWindow::for_date(date),
        )?;
        let end = occurrence.checked_add_signed(self.duration())?;

        Some(self.copy_with(TimeRegionPatch {
            start: Patch::SetTo(occurrence),
            end: Patch::SetTo(end),
            recurrence_rule: Patch::SetTo(None),
            ..Default::default()
        }))
    }
}

impl DayRegion {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    /// The region's own day as a half-open `[start, end)` span.
    pub fn span(&self) -> TimeWindow {
        TimeWindow::for_date(self.date)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        let span = self.span();
        contains(span.start, span.end, instant)
    }

    pub fn overlaps(&self, range_start: NaiveDateTime, range_end: NaiveDateTime) -> bool {
        let span = self.span();
        overlaps(span.start, span.end, range_start, range_end)
    }

    pub fn applies_to(&self, date: NaiveDate) -> bool {
        self.applies_to_with(date, default_manager())
    }

    /// Whether the region covers `date`. Time of day plays no part.
    pub fn applies_to_with(&self, date: NaiveDate, manager: &RecurrenceManager) -> bool {
        let Some(rule) = recurrence_of(self.recurrence_rule.as_deref()) else {
            return self.date == date;
        };

        first_occurrence(
            manager,
            self.id,
            rule,
            self.date.and_time(NaiveTime::MIN),
            TimeWindow::for_date(date),
        )
        .is_some()
    }
}
