use cadence_core::recurrence::EngineKind;
use clap::{Parser, Subcommand, ValueEnum};

/// Inspect RFC 5545 recurrence rules, their occurrences, and calendar regions
#[derive(Parser, Debug)]
#[command(name = "cadence", author, version, about, long_about = None)]
pub struct Cli {
    /// Log expansion details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse a rule and print its canonical form
    Validate(ValidateCommand),
    /// List the occurrences of a rule within a window
    Occurrences(OccurrencesCommand),
    /// Show the first occurrence after a point in time
    Next(NextCommand),
    /// Resolve a time region on a given date
    Region(RegionCommand),
    /// Check whether a day region covers a given date
    DayRegion(DayRegionCommand),
}

/// Generation engine selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineArg {
    Native,
    Rrule,
}

impl From<EngineArg> for EngineKind {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::Native => EngineKind::Native,
            EngineArg::Rrule => EngineKind::Rrule,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateCommand {
    /// The rule text, e.g. "FREQ=WEEKLY;BYDAY=MO,WE"
    pub rule: String,
    /// Print the rule as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OccurrencesCommand {
    /// The rule text
    pub rule: String,
    /// First occurrence of the series (DTSTART)
    #[arg(long)]
    pub anchor: String,
    /// Window start, inclusive (defaults to the anchor)
    #[arg(long)]
    pub from: Option<String>,
    /// Window end, exclusive (defaults to `default_window_days` after the start)
    #[arg(long)]
    pub to: Option<String>,
    /// Override the configured engine
    #[arg(long, value_enum)]
    pub engine: Option<EngineArg>,
    /// Dates whose occurrence is deleted
    #[arg(long, value_name = "DATE")]
    pub skip: Vec<String>,
    /// Show at most this many occurrences
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct NextCommand {
    /// The rule text
    pub rule: String,
    /// First occurrence of the series (DTSTART)
    #[arg(long)]
    pub anchor: String,
    /// Find the first occurrence strictly after this point (defaults to now)
    #[arg(long)]
    pub after: Option<String>,
    #[arg(long, value_enum)]
    pub engine: Option<EngineArg>,
}

#[derive(Parser, Debug, Clone)]
pub struct RegionCommand {
    /// Region start; also the anchor of a recurring region
    #[arg(long)]
    pub start: String,
    #[arg(long)]
    pub end: String,
    /// Recurrence rule; omit for a one-off region
    #[arg(long)]
    pub rrule: Option<String>,
    /// The date to resolve the region on
    #[arg(long)]
    pub on: String,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DayRegionCommand {
    /// The region's date; also the anchor of a recurring region
    #[arg(long)]
    pub date: String,
    #[arg(long)]
    pub rrule: Option<String>,
    /// The date to check
    #[arg(long)]
    pub on: String,
    #[arg(long)]
    pub json: bool,
}
