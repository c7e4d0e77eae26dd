//! Suite-scoped fixtures
//!
//! A [`Fixture`] is a lazily created value owned by the suite that
//! declared it. The value is built on first access from any test or
//! nested suite of that suite, and torn down when the suite finishes,
//! in reverse creation order, whether the suite succeeded or not.
//!
//! ```no_run
//! # use testtree::tree::SuiteBuilder;
//! fn database(s: &mut SuiteBuilder<'_>) {
//!     let db = s
//!         .fixture("db", || async { Ok(Vec::<String>::new()) })
//!         .close_with(|rows| async move {
//!             tracing::info!("closing db with {} rows", rows.len());
//!             Ok(())
//!         });
//!
//!     s.test("empty", move |_| {
//!         let db = db.clone();
//!         async move {
//!             anyhow::ensure!(db.get().await?.is_empty());
//!             Ok(())
//!         }
//!     });
//! }
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

use crate::error::FixtureError;

mod registry;

pub(crate) use registry::{FixtureRegistry, Teardown};

type Factory<T> = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;
type Closer<T> = Arc<dyn Fn(Arc<T>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Handle to a suite-scoped value
pub struct Fixture<T> {
    cell: Arc<FixtureCell<T>>,
}

impl<T> Clone for Fixture<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

struct FixtureCell<T> {
    name: String,
    registry: Weak<FixtureRegistry>,
    factory: Factory<T>,
    closer: Mutex<Option<Closer<T>>>,
    value: tokio::sync::Mutex<Option<Arc<T>>>,
}

impl<T: Send + Sync + 'static> Fixture<T> {
    pub(crate) fn new<F, Fut>(name: String, registry: &Arc<FixtureRegistry>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            cell: Arc::new(FixtureCell {
                name,
                registry: Arc::downgrade(registry),
                factory: Box::new(move || factory().boxed()),
                closer: Mutex::new(None),
                value: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Replace the default teardown, which drops the value.
    pub fn close_with<F, Fut>(self, close: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let closer: Closer<T> = Arc::new(move |value| close(value).boxed());
        *self
            .cell
            .closer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(closer);
        self
    }

    /// The fixture's value, created on first access.
    ///
    /// Fails with [`FixtureError`] outside the owning suite's execution.
    pub async fn get(&self) -> anyhow::Result<Arc<T>> {
        let registry = self
            .cell
            .registry
            .upgrade()
            .ok_or_else(|| FixtureError::SuiteGone {
                fixture: self.cell.name.clone(),
            })?;
        if !registry.is_active() {
            return Err(FixtureError::OutsideExecution {
                fixture: self.cell.name.clone(),
                suite: registry.suite().to_string(),
            }
            .into());
        }

        let mut value = self.cell.value.lock().await;
        if let Some(existing) = value.as_ref() {
            return Ok(existing.clone());
        }

        debug!("Creating fixture '{}' of '{}'", self.cell.name, registry.suite());
        let created = Arc::new((self.cell.factory)().await?);
        *value = Some(created.clone());
        registry.register(self.cell.clone());
        Ok(created)
    }
}

#[async_trait::async_trait]
impl<T: Send + Sync + 'static> Teardown for FixtureCell<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn tear_down(&self) -> anyhow::Result<()> {
        let Some(value) = self.value.lock().await.take() else {
            return Ok(());
        };
        let closer = self
            .closer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match closer {
            Some(close) => close(value).await,
            None => {
                drop(value);
                Ok(())
            }
        }
    }
}
