//! CLI argument parsing
//!
//! Arguments a test binary built on the harness accepts.

use anyhow::Result;
use clap::Parser;

use crate::executor::InvocationMode;
use crate::settings::{split_patterns, EnvConfig, HarnessSettings};

/// Run a tree of tests
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "testtree")]
#[command(about = "Run a tree of suites and tests")]
#[command(long_about = None)]
pub struct Args {
    /// Test path patterns to run (comma-separated, `*` wildcard)
    #[arg(short, long)]
    pub include: Option<String>,

    /// Test path patterns to skip (comma-separated, `*` wildcard)
    #[arg(short, long)]
    pub exclude: Option<String>,

    /// Abort the run after more than this many test failures
    #[arg(long)]
    pub fail_fast: Option<usize>,

    /// Run suite children concurrently unless configured otherwise
    #[arg(short, long)]
    pub concurrent: bool,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Settings file (YAML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// List enabled tests instead of running them
    #[arg(short, long)]
    pub list: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Describe the environment variables the harness reads, then exit
    #[arg(long)]
    pub env_help: bool,
}

impl Args {
    /// Resolve settings: command line over environment over file over
    /// defaults.
    pub fn resolve(&self, env: &EnvConfig) -> Result<HarnessSettings> {
        let file = self.config.as_ref().or(env.config_file.as_ref());
        let base = match file {
            Some(path) => HarnessSettings::load(path)?,
            None => HarnessSettings::default(),
        };

        let mut settings = base.merge_env(env);
        if let Some(include) = &self.include {
            settings.include = split_patterns(include);
        }
        if let Some(exclude) = &self.exclude {
            settings.exclude = split_patterns(exclude);
        }
        if self.fail_fast.is_some() {
            settings.fail_fast = self.fail_fast;
        }
        if self.concurrent {
            settings.invocation = InvocationMode::Concurrent;
        }
        if let Some(format) = &self.format {
            settings.format = format.clone();
        }
        if self.verbose {
            settings.log_level = "debug".to_string();
        }

        settings.validate()?;
        Ok(settings)
    }
}
