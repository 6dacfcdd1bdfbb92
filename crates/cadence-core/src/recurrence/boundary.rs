//! Boundary correction over any [`OccurrenceGenerator`].
//!
//! Generators disagree with RFC 5545 at the edges of a series. Two fixes are
//! applied here, once, for every caller:
//!
//! - COUNT: expansion always starts one instant before the anchor, never at
//!   the query window, and the result is truncated to `count` entries before
//!   the window is applied. Seeking straight into a late window would count
//!   occurrences from the wrong place.
//! - UNTIL: the bound is stripped before the generator runs, so an exclusive
//!   or instant-based cutoff cannot drop the final occurrence, and anything
//!   dated after UNTIL's calendar day is discarded afterwards.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::{OccurrenceGenerator, TimeWindow};
use crate::error::CoreError;
use crate::rule::{RuleDescriptor, Terminator, Until};

/// Wraps a generator with RFC 5545 COUNT and UNTIL semantics.
#[derive(Debug, Clone)]
pub struct BoundedExpander<G> {
    generator: G,
    max_occurrences: usize,
}

impl<G: OccurrenceGenerator> BoundedExpander<G> {
    pub fn new(generator: G, max_occurrences: usize) -> Self {
        Self {
            generator,
            max_occurrences,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Occurrences of `rule` anchored at `anchor` inside `window`.
    ///
    /// The result is ascending, duplicate-free, never earlier than the
    /// anchor, and at most `max_occurrences` long.
    pub fn expand(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        if window.is_empty() || window.end <= anchor {
            return Ok(Vec::new());
        }

        let mut occurrences = match rule.terminator() {
            Terminator::Never => {
                self.generator
                    .generate(rule, anchor, window, self.max_occurrences)?
            }
            Terminator::AfterCount(count) => self.expand_counted(rule, anchor, window, count)?,
            Terminator::Until(until) => self.expand_until(rule, anchor, window, until)?,
        };

        occurrences.sort_unstable();
        occurrences.dedup();
        occurrences.retain(|dt| *dt >= anchor && window.contains(*dt));
        occurrences.truncate(self.max_occurrences);
        Ok(occurrences)
    }

    fn expand_counted(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
        count: u32,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let from_anchor = TimeWindow {
            start: anchor
                .checked_sub_signed(Duration::seconds(1))
                .unwrap_or(anchor),
            end: window.end,
        };
        let count = usize::try_from(count).unwrap_or(usize::MAX);

        let mut series = self
            .generator
            .generate(&rule.without_terminator(), anchor, from_anchor, count)?;
        series.sort_unstable();
        series.dedup();
        series.retain(|dt| *dt >= anchor);
        series.truncate(count);

        debug!(
            count,
            walked = series.len(),
            "Applied COUNT from anchor"
        );
        Ok(series)
    }

    fn expand_until(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
        until: Until,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let last_day = until.last_day();
        let cutoff = last_day
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX);
        let bounded = TimeWindow {
            start: window.start,
            end: window.end.min(cutoff),
        };
        if bounded.is_empty() {
            return Ok(Vec::new());
        }

        let mut occurrences = self.generator.generate(
            &rule.without_terminator(),
            anchor,
            bounded,
            self.max_occurrences,
        )?;
        occurrences.retain(|dt| dt.date() <= last_day);

        debug!(%last_day, kept = occurrences.len(), "Applied inclusive UNTIL");
        Ok(occurrences)
    }
}
