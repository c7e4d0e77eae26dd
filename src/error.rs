//! Error types
//!
//! Typed errors raised by the engine. User code (test actions, wrapping
//! actions, fixture factories) works with `anyhow::Error`; the engine
//! recognizes the types below inside those errors to decide whether a
//! failure stays local or aborts the run.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Failure, FailureKind};

/// Fatal configuration errors, raised where the misconfiguration is detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("a session has already been declared for this run")]
    SessionAlreadyDeclared,

    #[error("no session has been declared for this run")]
    NoSession,

    #[error("primary execution resource requested by '{requested_by}' is already claimed by '{holder}'")]
    PrimaryResourceClaimed {
        holder: String,
        requested_by: String,
    },

    #[error("'{path}' is shared with an execution and can no longer be parameterized")]
    TreeFrozen { path: String },
}

/// Fixture access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    #[error("fixture '{fixture}' of '{suite}' accessed outside its suite's execution")]
    OutsideExecution { fixture: String, suite: String },

    #[error("fixture '{fixture}' outlived its suite")]
    SuiteGone { fixture: String },
}

/// Raised for every test entered after a fail-fast limit was exceeded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failing fast after {failures} test failure(s) (limit {limit})")]
pub struct FailingFast {
    pub failures: usize,
    pub limit: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("execution of '{path}' was cancelled")]
pub struct Cancelled {
    pub path: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{path}' panicked: {message}")]
pub struct Panicked {
    pub path: String,
    pub message: String,
}

impl Panicked {
    pub(crate) fn from_payload(path: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            path: path.to_string(),
            message,
        }
    }
}

/// A wrapping action returned `Ok` without running the action it wraps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("wrapping action of '{path}' returned without invoking its inner action")]
pub struct InnerNotInvoked {
    pub path: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{path}' timed out after {limit:?}")]
pub struct TimedOut {
    pub path: String,
    pub limit: Duration,
}

/// Top-level errors returned by the entry points
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("run aborted: {cause}")]
    Aborted { cause: Failure },
}

impl EngineError {
    /// Process exit code: 2 for aborted runs, 3 for configuration errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Configuration(_) => 3,
            EngineError::Aborted { cause } if cause.kind() == FailureKind::Configuration => 3,
            EngineError::Aborted { .. } => 2,
        }
    }
}
