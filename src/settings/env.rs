//! Environment variable overrides
//!
//! Every variable is `TESTTREE_` followed by the name of an [`EnvVar`].

use std::env;

const ENV_PREFIX: &str = "TESTTREE";

/// Variables read by [`EnvConfig::load`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvVar {
    Include,
    Exclude,
    FailFast,
    Concurrent,
    Format,
    Log,
    Config,
}

impl EnvVar {
    pub const ALL: [EnvVar; 7] = [
        EnvVar::Include,
        EnvVar::Exclude,
        EnvVar::FailFast,
        EnvVar::Concurrent,
        EnvVar::Format,
        EnvVar::Log,
        EnvVar::Config,
    ];

    pub fn key(self) -> String {
        let name = match self {
            EnvVar::Include => "INCLUDE",
            EnvVar::Exclude => "EXCLUDE",
            EnvVar::FailFast => "FAIL_FAST",
            EnvVar::Concurrent => "CONCURRENT",
            EnvVar::Format => "FORMAT",
            EnvVar::Log => "LOG",
            EnvVar::Config => "CONFIG",
        };
        format!("{ENV_PREFIX}_{name}")
    }

    fn help(self) -> &'static str {
        match self {
            EnvVar::Include => "Comma-separated test path patterns to run",
            EnvVar::Exclude => "Comma-separated test path patterns to skip",
            EnvVar::FailFast => "Abort after more than this many test failures",
            EnvVar::Concurrent => "Run suite children concurrently (true/false)",
            EnvVar::Format => "Output format (table, json, json-pretty, csv, summary)",
            EnvVar::Log => "Log level (trace, debug, info, warn, error)",
            EnvVar::Config => "Path to a YAML or JSON settings file",
        }
    }

    fn read(self) -> Option<String> {
        env::var(self.key()).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Settings overrides found in the environment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub include: Option<String>,
    pub exclude: Option<String>,
    /// Unparseable values are ignored
    pub fail_fast: Option<usize>,
    pub concurrent: Option<bool>,
    pub format: Option<String>,
    pub log: Option<String>,
    pub config_file: Option<String>,
}

impl EnvConfig {
    pub fn load() -> Self {
        Self {
            include: EnvVar::Include.read(),
            exclude: EnvVar::Exclude.read(),
            fail_fast: EnvVar::FailFast.read().and_then(|v| v.trim().parse().ok()),
            concurrent: EnvVar::Concurrent.read().map(|v| is_truthy(&v)),
            format: EnvVar::Format.read(),
            log: EnvVar::Log.read(),
            config_file: EnvVar::Config.read(),
        }
    }

    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Sets variables for the lifetime of the returned guard
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(EnvVar, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, var: EnvVar, value: impl ToString) -> Self {
        self.vars.push((var, value.to_string()));
        self
    }

    pub fn apply_scoped(self) -> EnvGuard {
        let mut previous = Vec::with_capacity(self.vars.len());
        for (var, value) in self.vars {
            let key = var.key();
            previous.push((key.clone(), env::var(&key).ok()));
            env::set_var(key, value);
        }
        EnvGuard { previous }
    }
}

/// Restores the variables an [`EnvBuilder`] replaced
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..).rev() {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

pub fn print_env_help() {
    println!("Environment variables:");
    for var in EnvVar::ALL {
        println!("  {:<22} {}", var.key(), var.help());
    }
}
