use std::fmt;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::rule::RuleDescriptor;

pub mod boundary;
pub mod native;
pub mod rrule_delegate;

pub use boundary::BoundedExpander;
pub use native::NativeEngine;
pub use rrule_delegate::RRuleCrateEngine;

static DEFAULT_MANAGER: OnceLock<RecurrenceManager> = OnceLock::new();

/// The shared manager with default configuration.
pub fn default_manager() -> &'static RecurrenceManager {
    DEFAULT_MANAGER.get_or_init(RecurrenceManager::with_defaults)
}

/// Occurrences of `rule` anchored at `anchor` within `[after, before)`.
///
/// Uses the default configuration (native engine). COUNT and UNTIL follow
/// RFC 5545: COUNT is counted from the anchor, UNTIL includes its whole day.
pub fn get_occurrences(
    rule: &RuleDescriptor,
    anchor: NaiveDateTime,
    after: NaiveDateTime,
    before: NaiveDateTime,
) -> Result<Vec<NaiveDateTime>, CoreError> {
    default_manager().occurrences_between(rule, anchor, after, before)
}

/// A half-open query window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The window covering one calendar day.
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN);
        let end = date
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Produces candidate occurrences for a rule.
///
/// Implementations return occurrences of `rule` anchored at `anchor` that
/// fall inside `window`, in ascending order, stopping after `limit` entries.
/// They are not trusted with COUNT or UNTIL: [`BoundedExpander`] hands them
/// an open-ended rule and applies both terminators itself.
pub trait OccurrenceGenerator: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
        limit: usize,
    ) -> Result<Vec<NaiveDateTime>, CoreError>;
}

impl OccurrenceGenerator for Box<dyn OccurrenceGenerator> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    fn generate(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
        limit: usize,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        self.as_ref().generate(rule, anchor, window, limit)
    }
}

/// Which [`OccurrenceGenerator`] a [`RecurrenceManager`] delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Native,
    Rrule,
}

impl EngineKind {
    pub fn generator(&self) -> Box<dyn OccurrenceGenerator> {
        match self {
            EngineKind::Native => Box::new(NativeEngine),
            EngineKind::Rrule => Box::new(RRuleCrateEngine),
        }
    }
}

/// Configuration for occurrence expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Upper bound on the occurrences returned by a single expansion
    pub max_occurrences: usize,
    /// Generation delegate
    pub engine: EngineKind,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_occurrences: 10_000,
            engine: EngineKind::Native,
        }
    }
}

/// RecurrenceManager: entry point for occurrence queries.
///
/// Responsibilities:
/// 1. Own the expansion configuration
/// 2. Route every query through the boundary correction layer
/// 3. Answer window, next-occurrence and preview queries
#[derive(Debug)]
pub struct RecurrenceManager {
    config: ExpansionConfig,
    expander: BoundedExpander<Box<dyn OccurrenceGenerator>>,
}

impl RecurrenceManager {
    /// Creates a manager using the generator named by `config.engine`.
    pub fn new(config: ExpansionConfig) -> Self {
        let generator = config.engine.generator();
        Self::with_generator(config, generator)
    }

    pub fn with_defaults() -> Self {
        Self::new(ExpansionConfig::default())
    }

    /// Creates a manager around a caller-supplied generator.
    ///
    /// `config.engine` is ignored in favour of `generator`.
    pub fn with_generator(
        config: ExpansionConfig,
        generator: Box<dyn OccurrenceGenerator>,
    ) -> Self {
        let expander = BoundedExpander::new(generator, config.max_occurrences);
        Self { config, expander }
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    pub fn generator_name(&self) -> &'static str {
        self.expander.generator().name()
    }

    /// Occurrences within `[after, before)`.
    ///
    /// # Returns
    /// * Ascending, duplicate-free occurrence date-times. An inverted window
    ///   is an error; an empty one yields no occurrences.
    pub fn occurrences_between(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        after: NaiveDateTime,
        before: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let window = TimeWindow::new(after, before)?;
        self.occurrences_in(rule, anchor, window)
    }

    pub fn occurrences_in(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        window: TimeWindow,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        debug!(
            rule = %rule,
            %anchor,
            start = %window.start,
            end = %window.end,
            engine = self.generator_name(),
            "Expanding recurrence"
        );
        self.expander.expand(rule, anchor, window)
    }

    /// Parses `text` and expands it; parse failures surface as errors.
    pub fn expand_text(
        &self,
        text: &str,
        anchor: NaiveDateTime,
        window: TimeWindow,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let rule: RuleDescriptor = text.parse()?;
        self.occurrences_in(&rule, anchor, window)
    }

    /// Finds the first occurrence strictly after `after`.
    ///
    /// # Behavior
    /// - Searches forward in growing windows, up to roughly four centuries
    /// - Returns `None` when the series has ended or nothing occurs in range
    pub fn next_occurrence_after(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        after: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, CoreError> {
        let Some(mut start) = after.checked_add_signed(Duration::seconds(1)) else {
            return Ok(None);
        };
        // A series never occurs before its anchor.
        start = start.max(anchor);

        for span_days in [31, 366, 3_660, 146_100] {
            let end = start
                .checked_add_signed(Duration::days(span_days))
                .unwrap_or(NaiveDateTime::MAX);
            let window = TimeWindow { start, end };
            if let Some(next) = self.occurrences_in(rule, anchor, window)?.into_iter().next() {
                return Ok(Some(next));
            }
            if end == NaiveDateTime::MAX {
                break;
            }
            start = end;
        }

        Ok(None)
    }

    /// Preview upcoming occurrences, looking ahead one year from `from`.
    pub fn preview_occurrences(
        &self,
        rule: &RuleDescriptor,
        anchor: NaiveDateTime,
        from: NaiveDateTime,
        count: usize,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let end = from
            .checked_add_signed(Duration::days(365))
            .unwrap_or(NaiveDateTime::MAX);
        let mut occurrences = self.occurrences_in(rule, anchor, TimeWindow { start: from, end })?;
        occurrences.truncate(count);
        Ok(occurrences)
    }
}

impl Default for RecurrenceManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
