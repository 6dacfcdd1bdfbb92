use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A field update in a `copy_with` operation.
///
/// `Keep` leaves the current value alone; `SetTo` replaces it, including
/// replacing an `Option` field with `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    SetTo(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn apply(self, current: T) -> T {
        match self {
            Patch::Keep => current,
            Patch::SetTo(value) => value,
        }
    }
}

/// A time-bounded region within a day, such as a lunch break or an
/// out-of-office block. Covers the half-open interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRegion {
    pub id: Uuid,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: Option<String>,
    pub label: Option<String>,
    pub icon: Option<String>,
    /// Consumed by drag validation; recurrence expansion ignores it.
    #[serde(default)]
    pub block_interaction: bool,
    /// RRULE text; `None` (or blank) for a one-off region.
    pub recurrence_rule: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl TimeRegion {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: Uuid::now_v7(),
            start,
            end,
            color: None,
            label: None,
            icon: None,
            block_interaction: false,
            recurrence_rule: None,
            metadata: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn copy_with(&self, patch: TimeRegionPatch) -> TimeRegion {
        TimeRegion {
            id: patch.id.apply(self.id),
            start: patch.start.apply(self.start),
            end: patch.end.apply(self.end),
            color: patch.color.apply(self.color.clone()),
            label: patch.label.apply(self.label.clone()),
            icon: patch.icon.apply(self.icon.clone()),
            block_interaction: patch.block_interaction.apply(self.block_interaction),
            recurrence_rule: patch.recurrence_rule.apply(self.recurrence_rule.clone()),
            metadata: patch.metadata.apply(self.metadata.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeRegionPatch {
    pub id: Patch<Uuid>,
    pub start: Patch<NaiveDateTime>,
    pub end: Patch<NaiveDateTime>,
    pub color: Patch<Option<String>>,
    pub label: Patch<Option<String>>,
    pub icon: Patch<Option<String>>,
    pub block_interaction: Patch<bool>,
    pub recurrence_rule: Patch<Option<String>>,
    pub metadata: Patch<Option<serde_json::Value>>,
}

/// A region that covers whole calendar days, such as a holiday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRegion {
    pub id: Uuid,
    /// The first day of the series, or the only day of a one-off region.
    pub date: NaiveDate,
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub block_interaction: bool,
    pub color: Option<String>,
    pub label: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl DayRegion {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: Uuid::now_v7(),
            date,
            recurrence_rule: None,
            block_interaction: false,
            color: None,
            label: None,
            metadata: None,
        }
    }
}

/// A calendar event, optionally recurring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
    pub recurrence_rule: Option<String>,
    /// Per-occurrence changes, keyed by the original occurrence date.
    #[serde(default)]
    pub recurrence_exceptions: Vec<RecurrenceException<CalendarEvent>>,
    pub metadata: Option<serde_json::Value>,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            description: None,
            start,
            end,
            all_day: false,
            recurrence_rule: None,
            recurrence_exceptions: Vec::new(),
            metadata: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn copy_with(&self, patch: EventPatch) -> CalendarEvent {
        CalendarEvent {
            id: patch.id.apply(self.id),
            title: patch.title.apply(self.title.clone()),
            description: patch.description.apply(self.description.clone()),
            start: patch.start.apply(self.start),
            end: patch.end.apply(self.end),
            all_day: patch.all_day.apply(self.all_day),
            recurrence_rule: patch.recurrence_rule.apply(self.recurrence_rule.clone()),
            recurrence_exceptions: patch
                .recurrence_exceptions
                .apply(self.recurrence_exceptions.clone()),
            metadata: patch.metadata.apply(self.metadata.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub id: Patch<Uuid>,
    pub title: Patch<String>,
    pub description: Patch<Option<String>>,
    pub start: Patch<NaiveDateTime>,
    pub end: Patch<NaiveDateTime>,
    pub all_day: Patch<bool>,
    pub recurrence_rule: Patch<Option<String>>,
    pub recurrence_exceptions: Patch<Vec<RecurrenceException<CalendarEvent>>>,
    pub metadata: Patch<Option<serde_json::Value>>,
}

/// A change to one occurrence of an otherwise regular series.
///
/// Keyed by the occurrence's original calendar date. Sub-daily frequencies
/// are not supported, so a series has at most one occurrence per day and
/// the date identifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecurrenceException<T> {
    /// The occurrence is removed.
    Deleted { original_date: NaiveDate },
    /// The occurrence moves to `new_start`; duration and content are kept.
    Rescheduled {
        original_date: NaiveDate,
        new_start: NaiveDateTime,
    },
    /// The occurrence is replaced wholesale.
    Modified { original_date: NaiveDate, replacement: T },
}

impl<T> RecurrenceException<T> {
    pub fn original_date(&self) -> NaiveDate {
        match self {
            RecurrenceException::Deleted { original_date }
            | RecurrenceException::Rescheduled { original_date, .. }
            | RecurrenceException::Modified { original_date, .. } => *original_date,
        }
    }
}
