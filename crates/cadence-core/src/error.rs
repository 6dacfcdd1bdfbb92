use thiserror::Error;

use crate::rule::Frequency;

/// Errors raised while constructing a [`RuleDescriptor`](crate::rule::RuleDescriptor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("COUNT and UNTIL are mutually exclusive")]
    CountAndUntil,

    #[error("Interval must be at least 1, got {0}")]
    InvalidInterval(u32),

    #[error("COUNT must be at least 1")]
    ZeroCount,

    #[error("{field} is only valid for YEARLY rules, not {frequency}")]
    YearlyOnlyField {
        field: &'static str,
        frequency: Frequency,
    },

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: i32 },

    #[error("BYDAY ordinals are only valid for MONTHLY and YEARLY rules, not {0}")]
    OrdinalWeekday(Frequency),

    #[error("BYDAY ordinals cannot be combined with BYWEEKNO")]
    OrdinalWithWeekNumber,

    #[error("BYMONTHDAY is not valid for WEEKLY rules")]
    MonthDayOnWeekly,
}

/// Errors returned by the RRULE text codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Recurrence rule is empty")]
    Empty,

    #[error("Malformed rule part '{0}', expected KEY=VALUE")]
    MalformedPart(String),

    #[error("Duplicate rule part '{0}'")]
    DuplicateKey(String),

    #[error("Unknown rule part '{0}'")]
    UnknownKey(String),

    #[error("Recurrence rule has no FREQ part")]
    MissingFrequency,

    #[error("Unknown frequency '{0}'")]
    UnknownFrequency(String),

    #[error("Unsupported frequency '{0}': sub-daily recurrence is not supported")]
    UnsupportedFrequency(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Rule(#[from] RuleError),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid recurrence rule: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid recurrence rule: {0}")]
    Rule(#[from] RuleError),

    #[error("Occurrence generator failed: {0}")]
    Delegate(String),

    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },
}
