//! Failure values carried by events
//!
//! A [`Failure`] is the engine's throwable: a shared `anyhow::Error`, its
//! classification, and the secondary failures suppressed in its favour.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::error::{Cancelled, ConfigurationError, FailingFast};

/// Failure classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An ordinary failure, recovered where it happens.
    Test,
    FailingFast,
    Configuration,
    Cancelled,
}

impl FailureKind {
    /// Aborting kinds always propagate to the entry point.
    pub fn aborts_run(self) -> bool {
        !matches!(self, FailureKind::Test)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Test => write!(f, "failure"),
            FailureKind::FailingFast => write!(f, "failing fast"),
            FailureKind::Configuration => write!(f, "configuration error"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A shared, immutable failure with suppressed secondaries.
#[derive(Clone)]
pub struct Failure {
    error: Arc<anyhow::Error>,
    kind: FailureKind,
    suppressed: Vec<Failure>,
}

impl Failure {
    /// Wrap an error. An error that already carries a `Failure` yields
    /// that failure unchanged, including its suppressed list.
    pub fn new(error: anyhow::Error) -> Self {
        match error.downcast::<Failure>() {
            Ok(failure) => failure,
            Err(error) => {
                let kind = Self::kind_of(&error);
                Self {
                    error: Arc::new(error),
                    kind,
                    suppressed: Vec::new(),
                }
            }
        }
    }

    /// Classify an error by the engine types found in its chain.
    pub fn kind_of(error: &anyhow::Error) -> FailureKind {
        for cause in error.chain() {
            if let Some(failure) = cause.downcast_ref::<Failure>() {
                return failure.kind;
            }
            if cause.is::<FailingFast>() {
                return FailureKind::FailingFast;
            }
            if cause.is::<ConfigurationError>() {
                return FailureKind::Configuration;
            }
            if cause.is::<Cancelled>() {
                return FailureKind::Cancelled;
            }
        }
        FailureKind::Test
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn aborts_run(&self) -> bool {
        self.kind.aborts_run()
    }

    pub fn is_failing_fast(&self) -> bool {
        self.kind == FailureKind::FailingFast
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn suppressed(&self) -> &[Failure] {
        &self.suppressed
    }

    /// Returns a new failure with `other` attached as a suppressed secondary.
    pub fn with_suppressed(&self, other: Failure) -> Self {
        let mut suppressed = self.suppressed.clone();
        suppressed.push(other);
        Self {
            error: self.error.clone(),
            kind: self.kind,
            suppressed,
        }
    }

    /// Convert back into an `anyhow::Error` without losing identity.
    pub fn into_error(self) -> anyhow::Error {
        anyhow::Error::new(self)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Failure::new(error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if f.alternate() {
            for suppressed in &self.suppressed {
                write!(f, "\n  suppressed: {suppressed:#}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .field("error", &self.error.to_string())
            .field("suppressed", &self.suppressed)
            .finish()
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let inner: &(dyn StdError + Send + Sync + 'static) = (*self.error).as_ref();
        Some(inner)
    }
}
