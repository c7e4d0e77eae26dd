//! Harness settings
//!
//! Settings a harness applies to the session it runs: default invocation
//! mode, fail-fast limit, test selection, output format and log level.
//! Loaded from YAML or JSON, then overridden by the environment and the
//! command line.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::executor::InvocationMode;
use crate::output::OutputFormat;
use crate::selection::PatternSelection;
use crate::utils::logger::LogLevel;

pub mod env;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard, EnvVar};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// How suites run their children unless configured otherwise
    pub invocation: InvocationMode,

    /// Abort after more than this many test failures
    pub fail_fast: Option<usize>,

    /// Test path patterns to include, all when empty
    pub include: Vec<String>,

    /// Test path patterns to exclude
    pub exclude: Vec<String>,

    /// Output format (table, json, json-pretty, summary)
    pub format: String,

    pub log_level: String,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            invocation: InvocationMode::Sequential,
            fail_fast: None,
            include: Vec::new(),
            exclude: Vec::new(),
            format: "table".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl HarnessSettings {
    /// Load settings from file, YAML or JSON by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read settings file")?;

        let settings: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML settings")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON settings")?
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if is_yaml(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize settings")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?
        };

        std::fs::write(path, content).context("Failed to write settings file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if OutputFormat::parse(&self.format).is_none() {
            bail!(
                "Unknown output format '{}', expected one of {}",
                self.format,
                OutputFormat::NAMES.join(", ")
            );
        }
        if LogLevel::parse(&self.log_level).is_none() {
            bail!("Unknown log level '{}'", self.log_level);
        }
        Ok(())
    }

    /// Apply overrides read from the environment.
    pub fn merge_env(mut self, env: &EnvConfig) -> Self {
        if let Some(include) = &env.include {
            self.include = split_patterns(include);
        }
        if let Some(exclude) = &env.exclude {
            self.exclude = split_patterns(exclude);
        }
        if env.fail_fast.is_some() {
            self.fail_fast = env.fail_fast;
        }
        if let Some(concurrent) = env.concurrent {
            self.invocation = if concurrent {
                InvocationMode::Concurrent
            } else {
                InvocationMode::Sequential
            };
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(log) = &env.log {
            self.log_level = log.clone();
        }
        self
    }

    pub fn selection(&self) -> PatternSelection {
        PatternSelection::from_patterns(self.include.clone(), self.exclude.clone())
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::parse(&self.format).unwrap_or(OutputFormat::Table)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::INFO)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

pub(crate) fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
