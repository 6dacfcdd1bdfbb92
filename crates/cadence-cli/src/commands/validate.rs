use anyhow::Result;
use cadence_core::error::CoreError;
use cadence_core::RuleDescriptor;
use owo_colors::OwoColorize;
use serde_json::json;

use crate::cli::ValidateCommand;
use crate::views::table::display_rule;

pub fn validate_rule(command: ValidateCommand) -> Result<()> {
    let rule: RuleDescriptor = command.rule.parse().map_err(CoreError::from)?;

    if command.json {
        let output = json!({
            "rule": rule.to_string(),
            "frequency": rule.frequency().to_string(),
            "interval": rule.interval(),
            "count": rule.count(),
            "until": rule.until().map(|until| until.last_day()),
            "finite": rule.is_finite(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "✓ Valid rule:".green(), rule.to_rrule_line().bold());
    display_rule(&rule);
    Ok(())
}
