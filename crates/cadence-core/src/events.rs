use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::exceptions::apply_exceptions;
use crate::models::{CalendarEvent, EventPatch, Patch, RecurrenceException};
use crate::recurrence::{RecurrenceManager, TimeWindow};
use crate::region::{overlaps, recurrence_of};

impl CalendarEvent {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    pub fn overlaps(&self, range_start: NaiveDateTime, range_end: NaiveDateTime) -> bool {
        overlaps(self.start, self.end, range_start, range_end)
    }

    /// Materializes the event within `[after, before)`.
    ///
    /// # Returns
    /// * Concrete single-occurrence events that overlap the range, ordered by
    ///   start. Each copy keeps the series duration and content and carries
    ///   neither a recurrence rule nor exceptions.
    ///
    /// # Behavior
    /// - A one-off event is returned as-is when it overlaps the range
    /// - Occurrences that started before `after` but are still running count
    /// - The event's exceptions are overlaid, including reschedules that move
    ///   an occurrence from outside the range into it
    /// - An unusable recurrence rule yields no occurrences and a warning
    pub fn occurrences_between(
        &self,
        manager: &RecurrenceManager,
        after: NaiveDateTime,
        before: NaiveDateTime,
    ) -> Vec<CalendarEvent> {
        if after >= before {
            return Vec::new();
        }

        let rule = match recurrence_of(self.recurrence_rule.as_deref()) {
            None => {
                return if self.overlaps(after, before) {
                    vec![self.clone()]
                } else {
                    Vec::new()
                };
            }
            Some(Ok(rule)) => rule,
            Some(Err(e)) => {
                warn!(
                    event_id = %self.id,
                    error = %e,
                    "Ignoring event with unusable recurrence rule"
                );
                return Vec::new();
            }
        };

        let duration = self.duration();
        let window = TimeWindow {
            start: after.checked_sub_signed(duration).unwrap_or(after),
            end: before,
        };

        let mut starts = match manager.occurrences_in(&rule, self.start, window) {
            Ok(starts) => starts,
            Err(e) => {
                warn!(event_id = %self.id, error = %e, "Failed to expand recurring event");
                return Vec::new();
            }
        };

        // A moved or replaced occurrence can land in range while its
        // original date lies outside it.
        for exception in &self.recurrence_exceptions {
            if matches!(exception, RecurrenceException::Deleted { .. }) {
                continue;
            }
            let day = TimeWindow::for_date(exception.original_date());
            if day.end > window.start && day.start < window.end {
                continue;
            }
            match manager.occurrences_in(&rule, self.start, day) {
                Ok(found) => starts.extend(found),
                Err(e) => {
                    warn!(event_id = %self.id, error = %e, "Failed to expand exception date");
                }
            }
        }

        let materialized: Vec<CalendarEvent> = starts
            .into_iter()
            .filter_map(|start| Some(self.materialize(start, start.checked_add_signed(duration)?)))
            .collect();
        let total = materialized.len();

        let mut occurrences = apply_exceptions(materialized, &self.recurrence_exceptions);
        occurrences.retain(|occurrence| occurrence.overlaps(after, before));

        debug!(
            event_id = %self.id,
            expanded = total,
            returned = occurrences.len(),
            "Materialized recurring event"
        );
        occurrences
    }

    fn materialize(&self, start: NaiveDateTime, end: NaiveDateTime) -> CalendarEvent {
        self.copy_with(EventPatch {
            start: Patch::SetTo(start),
            end: Patch::SetTo(end),
            recurrence_rule: Patch::SetTo(None),
            recurrence_exceptions: Patch::SetTo(Vec::new()),
            ..Default::default()
        })
    }
}
