use chrono::NaiveDateTime;
use rrule::RRuleSet;
use tracing::debug;

use super::{OccurrenceGenerator, TimeWindow};
use crate::codec::serialize;
use crate::error::CoreError;
use crate::rule::{RuleDescriptor, Terminator};

/// Delegates candidate generation to the `rrule` crate.
///
/// Naive date-times are handed over as UTC wall-clock values and read back
/// with `naive_utc`, so no offset is ever applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleCrateEngine;

impl RRuleCrateEngine {
    /// Builds the `DTSTART`/`RRULE` pair the `rrule` crate parses.
    fn rrule_text(rule: &RuleDescriptor, anchor: NaiveDateTime) -> String {
        let mut rrule = serialize(&rule.without_terminator());
        match rule.terminator() {
            Terminator::Never => {}
            Terminator::AfterCount(count) => rrule.push_str(&format!(";COUNT={count}")),
            // The crate requires UNTIL in the same zone as DTSTART.
            Terminator::Until(until) => rrule.push_str(&format!(
                ";UNTIL={}Z",
                until.as_datetime().format("%Y%m%dT%H%M%S")
            )),
        }
        format!("DTSTART:{}Z\nRRULE:{}", anchor.format("%Y%m%dT%H%M%S"), rrule)
    }
}

impl OccurrenceGenerator for RRuleCrateEngine {
    fn name(&self) -> &'static str {
        "rrule"
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

        let text = Self::rrule_text(rule, anchor);
        debug!(rrule = %text.replace('\n', " "), "Delegating to rrule crate");
        let rrule_set = text
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::Delegate(format!("Failed to parse RRULE '{text}': {e}")))?;

        for occurrence in &rrule_set {
            let occurrence = occurrence.naive_utc();
            if occurrence >= window.end {
                break;
            }
            if occurrence < window.start {
                continue;
            }
            occurrences.push(occurrence);
            if occurrences.len() >= limit {
                break;
            }
        }

        Ok(occurrences)
    }
}
