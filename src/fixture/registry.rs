//! Per-suite fixture bookkeeping

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::Panicked;
use crate::models::Failure;

/// A created fixture waiting for teardown
#[async_trait]
pub(crate) trait Teardown: Send + Sync {
    fn name(&self) -> &str;

    /// Release the value. Does nothing when there is none.
    async fn tear_down(&self) -> anyhow::Result<()>;
}

/// Fixtures created during one execution of a suite, most recent first
pub(crate) struct FixtureRegistry {
    suite: String,
    active: AtomicBool,
    created: Mutex<Vec<Arc<dyn Teardown>>>,
}

impl FixtureRegistry {
    pub(crate) fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            active: AtomicBool::new(false),
            created: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn suite(&self) -> &str {
        &self.suite
    }

    /// Open the suite's execution window.
    pub(crate) fn open(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.created.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn register(&self, fixture: Arc<dyn Teardown>) {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, fixture);
    }

    /// Close the window and tear down every created fixture, most recent
    /// first.
    ///
    /// Returns `primary` if set, otherwise the first teardown failure.
    /// Every later teardown failure is attached to it as suppressed.
    pub(crate) async fn tear_down(&self, primary: Option<Failure>) -> Option<Failure> {
        self.active.store(false, Ordering::SeqCst);
        let created = std::mem::take(&mut *self.created.lock().unwrap_or_else(PoisonError::into_inner));

        let mut outcome = primary;
        for fixture in created {
            debug!("Tearing down fixture '{}' of '{}'", fixture.name(), self.suite);
            let result = match AssertUnwindSafe(fixture.tear_down()).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(Panicked::from_payload(fixture.name(), payload).into()),
            };
            if let Err(error) = result {
                let failure = Failure::new(error);
                warn!(
                    "Fixture '{}' of '{}' failed on close: {}",
                    fixture.name(),
                    self.suite,
                    failure
                );
                outcome = Some(match outcome {
                    Some(primary) => primary.with_suppressed(failure),
                    None => failure,
                });
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Recorded {
        name: &'static str,
        fails: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Teardown for Recorded {
        fn name(&self) -> &str {
            self.name
        }

        async fn tear_down(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fails {
                Err(anyhow!("{} failed", self.name))
            } else {
                Ok(())
            }
        }
    }

    fn registry(log: &Arc<Mutex<Vec<&'static str>>>, fixtures: &[(&'static str, bool)]) -> FixtureRegistry {
        let registry = FixtureRegistry::new("s");
        registry.open();
        for &(name, fails) in fixtures {
            registry.register(Arc::new(Recorded {
                name,
                fails,
                log: log.clone(),
            }));
        }
        registry
    }

    #[tokio::test]
    async fn test_reverse_order_and_aggregation() {
        let log = Arc::default();
        let registry = registry(&log, &[("f1", false), ("f2", true), ("f3", true)]);

        let failure = registry.tear_down(None).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["f3", "f2", "f1"]);
        assert_eq!(failure.message(), "f3 failed");
        assert_eq!(failure.suppressed().len(), 1);
        assert_eq!(failure.suppressed()[0].message(), "f2 failed");
        assert!(!registry.is_active());
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_stays_first() {
        let log = Arc::default();
        let registry = registry(&log, &[("f1", true)]);

        let failure = registry
            .tear_down(Some(Failure::new(anyhow!("body failed"))))
            .await
            .unwrap();

        assert_eq!(failure.message(), "body failed");
        assert_eq!(failure.suppressed()[0].message(), "f1 failed");
    }

    #[tokio::test]
    async fn test_clean_teardown() {
        let log = Arc::default();
        let registry = registry(&log, &[("f1", false), ("f2", false)]);
        assert!(registry.tear_down(None).await.is_none());
        assert_eq!(log.lock().unwrap().len(), 2);
    }
}
