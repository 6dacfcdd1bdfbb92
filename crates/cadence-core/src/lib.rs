//! # Cadence Core Library
//!
//! RFC 5545 recurrence for calendar events, time regions and day regions:
//! rule parsing, occurrence expansion with correct COUNT and UNTIL handling,
//! and per-occurrence exceptions.
//!
//! ## Features
//!
//! - **RRULE Codec**: Strongly-typed `RuleDescriptor` with lossless
//!   parse/serialize of the `FREQ=...;BYDAY=...` grammar
//! - **Pluggable Expansion**: A native engine and an `rrule` crate delegate
//!   behind one `OccurrenceGenerator` trait
//! - **Boundary Correction**: COUNT is always walked from the anchor and UNTIL
//!   includes its whole calendar day, whichever engine runs
//! - **Regions**: Day-level and time-of-day regions that degrade to "absent"
//!   instead of failing when their rule is malformed
//! - **Exceptions**: Delete, reschedule or replace single occurrences
//!
//! ## Core Modules
//!
//! - [`rule`]: Rule descriptor and builder with construction-time validation
//! - [`codec`]: RRULE text parsing and serialization
//! - [`recurrence`]: Expansion engines, boundary correction and the manager
//! - [`region`]: Region occurrence adapter and interval predicates
//! - [`exceptions`]: Exception overlay
//! - [`events`]: Calendar event materialization
//! - [`models`]: Core data structures
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cadence_core::{get_occurrences, RuleDescriptor};
//! use chrono::NaiveDate;
//!
//! let rule: RuleDescriptor = "FREQ=DAILY;COUNT=5".parse()?;
//! let anchor = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let after = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let before = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!
//! // Jan 1..=5 exist; the window only sees the last three.
//! let occurrences = get_occurrences(&rule, anchor, after, before)?;
//! assert_eq!(occurrences.len(), 3);
//! # Ok::<(), cadence_core::error::CoreError>(())
//! ```

pub mod codec;
pub mod error;
pub mod events;
pub mod exceptions;
pub mod models;
pub mod recurrence;
pub mod region;
pub mod rule;

pub use error::{CoreError, ParseError, RuleError};
pub use exceptions::{apply_exceptions, Occurrence};
pub use models::{CalendarEvent, DayRegion, Patch, RecurrenceException, TimeRegion};
pub use recurrence::{get_occurrences, RecurrenceManager, TimeWindow};
pub use rule::{Frequency, RuleDescriptor, Terminator, Until, WeekdayNum};
