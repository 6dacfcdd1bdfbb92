use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

/// Test harness running the CLI inside an isolated working directory, so a
/// stray `cadence.toml` or `CADENCE_*` variable cannot leak into a test
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path())
            .env_remove("RUST_LOG")
            .env_remove("CADENCE_ENGINE")
            .env_remove("CADENCE_MAX_OCCURRENCES")
            .env_remove("CADENCE_DEFAULT_WINDOW_DAYS")
            .env_remove("CADENCE_DATE_FORMAT");
        cmd
    }

    /// Write a `cadence.toml` into the working directory
    pub fn write_config(&self, contents: &str) {
        fs::write(self.temp_dir.path().join("cadence.toml"), contents)
            .expect("Failed to write config file");
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Run a command and parse its stdout as JSON
    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.run_success(args).get_output().stdout.clone();
        serde_json::from_slice(&output).expect("stdout is valid JSON")
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains the occurrence table headers
    pub fn has_occurrence_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Occurrence").and(predicate::str::contains("Weekday"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
