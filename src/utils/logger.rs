//! Logging utilities
//!
//! Subscriber setup for harness binaries. The library itself only emits
//! `tracing` events under the `testtree` target.

use std::fmt;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Verbosity of the engine's own log output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevel(Level);

impl LogLevel {
    pub const TRACE: LogLevel = LogLevel(Level::TRACE);
    pub const DEBUG: LogLevel = LogLevel(Level::DEBUG);
    pub const INFO: LogLevel = LogLevel(Level::INFO);
    pub const WARN: LogLevel = LogLevel(Level::WARN);
    pub const ERROR: LogLevel = LogLevel(Level::ERROR);

    /// Accepts level names in any case, plus `warning`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "warning" => Some(Self::WARN),
            name if name.chars().all(char::is_alphabetic) => name.parse().ok().map(LogLevel),
            _ => None,
        }
    }

    pub fn as_tracing_level(self) -> Level {
        self.0
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filter directive for the engine's own events at `level`. `RUST_LOG`
/// directives, when set, are added after it.
pub fn filter_directive(level: LogLevel) -> String {
    let base = format!("testtree={}", level);
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(extra) if !extra.trim().is_empty() => format!("{base},{extra}"),
        _ => base,
    }
}

/// Initialize the global subscriber. Does nothing if one is already set.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::try_new(filter_directive(level))
        .unwrap_or_else(|_| EnvFilter::new(format!("testtree={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
