use cadence_core::error::{CoreError, ParseError};
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod commands;
mod config;
mod parser;
mod views;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::new().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable configuration, using defaults");
        config::Config::default()
    });

    let result = match cli.command {
        cli::Commands::Validate(command) => commands::validate::validate_rule(command),
        cli::Commands::Occurrences(command) => {
            commands::occurrences::list_occurrences(command, &config)
        }
        cli::Commands::Next(command) => commands::occurrences::next_occurrence(command, &config),
        cli::Commands::Region(command) => commands::region::show_region(command, &config),
        cli::Commands::DayRegion(command) => commands::region::show_day_region(command, &config),
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        match core_error {
            CoreError::Parse(ParseError::UnsupportedFrequency(frequency)) => {
                eprintln!(
                    "{} {} rules are not supported",
                    "Error:".style(error_style),
                    frequency.yellow()
                );
                eprintln!("Use DAILY, WEEKLY, MONTHLY or YEARLY.");
            }
            CoreError::Parse(_) | CoreError::Rule(_) => {
                eprintln!("{} {}", "Error:".style(error_style), core_error);
            }
            CoreError::InvalidWindow { start, end } => {
                eprintln!(
                    "{} The window start {} is after its end {}",
                    "Error:".style(error_style),
                    start.yellow(),
                    end.yellow()
                );
            }
            CoreError::Delegate(s) => {
                eprintln!(
                    "{} The rrule engine rejected the rule: {}",
                    "Error:".style(error_style),
                    s
                );
            }
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
