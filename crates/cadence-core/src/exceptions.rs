use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::models::{CalendarEvent, RecurrenceException, TimeRegion};

/// Something produced by expanding a series that exceptions can act on.
pub trait Occurrence: Clone {
    /// When this occurrence starts. Its date keys exception lookup.
    fn occurrence_start(&self) -> NaiveDateTime;

    /// This occurrence moved to `new_start`, everything else unchanged.
    /// `None` when the moved occurrence would end past the calendar's range.
    fn rescheduled_to(&self, new_start: NaiveDateTime) -> Option<Self>;
}

impl Occurrence for NaiveDateTime {
    fn occurrence_start(&self) -> NaiveDateTime {
        *self
    }

    fn rescheduled_to(&self, new_start: NaiveDateTime) -> Option<Self> {
        Some(new_start)
    }
}

impl Occurrence for CalendarEvent {
    fn occurrence_start(&self) -> NaiveDateTime {
        self.start
    }

    fn rescheduled_to(&self, new_start: NaiveDateTime) -> Option<Self> {
        let mut moved = self.clone();
        moved.end = new_start.checked_add_signed(self.duration())?;
        moved.start = new_start;
        Some(moved)
    }
}

impl Occurrence for TimeRegion {
    fn occurrence_start(&self) -> NaiveDateTime {
        self.start
    }

    fn rescheduled_to(&self, new_start: NaiveDateTime) -> Option<Self> {
        let mut moved = self.clone();
        moved.end = new_start.checked_add_signed(self.duration())?;
        moved.start = new_start;
        Some(moved)
    }
}

/// Overlays per-occurrence exceptions onto an expanded series.
///
/// # Behavior
/// - `Deleted` drops the occurrence on its original date
/// - `Rescheduled` moves it to the new start, keeping duration and content;
///   a move whose end would overflow the calendar leaves it in place
/// - `Modified` swaps in the replacement as-is
/// - Occurrences without an exception pass through unchanged
/// - Exceptions matching no occurrence are ignored; when several target the
///   same date the last one wins
///
/// The result is ordered by start time.
pub fn apply_exceptions<T: Occurrence>(
    occurrences: Vec<T>,
    exceptions: &[RecurrenceException<T>],
) -> Vec<T> {
    if exceptions.is_empty() {
        return occurrences;
    }

    let by_date: HashMap<NaiveDate, &RecurrenceException<T>> = exceptions
        .iter()
        .map(|exception| (exception.original_date(), exception))
        .collect();
    let mut matched = HashSet::with_capacity(by_date.len());
    let mut result = Vec::with_capacity(occurrences.len());

    for occurrence in occurrences {
        let original_date = occurrence.occurrence_start().date();
        match by_date.get(&original_date) {
            None => result.push(occurrence),
            Some(exception) => {
                matched.insert(original_date);
                match exception {
                    RecurrenceException::Deleted { .. } => {}
                    RecurrenceException::Rescheduled { new_start, .. } => {
                        let moved = occurrence.rescheduled_to(*new_start);
                        if moved.is_none() {
                            warn!(
                                %original_date,
                                %new_start,
                                "Reschedule overflows, keeping occurrence"
                            );
                        }
                        result.push(moved.unwrap_or(occurrence));
                    }
                    RecurrenceException::Modified { replacement, .. } => {
                        result.push(replacement.clone());
                    }
                }
            }
        }
    }

    let stale = by_date.len() - matched.len();
    if stale > 0 {
        debug!(stale, "Ignoring exceptions that match no occurrence");
    }

    result.sort_by_key(|occurrence| occurrence.occurrence_start());
    result
}
