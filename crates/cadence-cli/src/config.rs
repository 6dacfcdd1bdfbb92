use std::path::Path;

use cadence_core::recurrence::{EngineKind, ExpansionConfig};
use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

const CONFIG_FILE: &str = "cadence.toml";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Generation engine used unless a command overrides it
    pub engine: EngineKind,
    /// Cap on occurrences returned by one expansion
    pub max_occurrences: usize,
    /// Window length when `--to` is omitted
    pub default_window_days: u32,
    /// chrono format string for table output
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        let expansion = ExpansionConfig::default();
        Self {
            engine: expansion.engine,
            max_occurrences: expansion.max_occurrences,
            default_window_days: 30,
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::load(CONFIG_FILE)
    }

    /// Merges `path` (if present) and `CADENCE_*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        let config: Config = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CADENCE_"))
            .extract()?;

        if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(figment::Error::from(format!(
                "Invalid date_format '{}'",
                config.date_format
            )));
        }
        Ok(config)
    }

    pub fn expansion(&self) -> ExpansionConfig {
        ExpansionConfig {
            max_occurrences: self.max_occurrences,
            engine: self.engine,
        }
    }
}
