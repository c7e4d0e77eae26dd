//! Configuration constructors
//!
//! Ready-made configurations. Each returns a fresh value; combine them
//! with [`Configuration::chained_with`].

use futures::FutureExt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Configuration, Inner, WrappingAction};
use crate::error::{FailingFast, TimedOut};
use crate::executor::InvocationMode;
use crate::models::{ElementInfo, ElementKind, Failure, FailureKind};
use crate::report::ReportSink;
use crate::resource::PrimaryResource;
use crate::tree::ElementCore;

impl Configuration {
    /// Runs `action` on the element while the tree is parameterized.
    pub fn parameterizing<F>(action: F) -> Self
    where
        F: Fn(&mut ElementCore) + Send + Sync + 'static,
    {
        Self::from_parameterizing(Arc::new(action))
    }

    pub fn disabled() -> Self {
        Self::parameterizing(|core| core.set_enabled(false))
    }

    pub fn enabled_if(condition: bool) -> Self {
        if condition {
            Self::empty()
        } else {
            Self::disabled()
        }
    }

    pub fn display_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::parameterizing(move |core| core.set_display_name(name.clone()))
    }

    /// Encloses the element's execution. `action` must run its [`Inner`]
    /// exactly once.
    pub fn wrapping<F, Fut>(action: F) -> Self
    where
        F: Fn(Arc<ElementInfo>, Inner) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_wrapping(boxed(action))
    }

    /// Encloses a suite's execution once, around all of its children.
    pub fn around_all<F, Fut>(action: F) -> Self
    where
        F: Fn(Arc<ElementInfo>, Inner) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::wrapping(action)
    }

    /// Encloses the execution of the element and of every element below
    /// it, each independently. Repeated attachments nest in declaration
    /// order, the first outermost.
    pub fn around_each<F, Fut>(action: F) -> Self
    where
        F: Fn(Arc<ElementInfo>, Inner) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let traversal = boxed(action);
        Self::from_wrapping(Arc::new(move |element: Arc<ElementInfo>, inner: Inner| {
            let installed = traversal.clone();
            let inner = inner.with_context(|context| context.with_traversal(installed));
            traversal(element, inner)
        }))
    }

    /// Sets how suites in the subtree run their children, unless a
    /// nested configuration sets it again.
    pub fn invocation(mode: InvocationMode) -> Self {
        Self::from_wrapping(Arc::new(move |element: Arc<ElementInfo>, inner: Inner| {
            debug!("{} invokes children {}", element, mode);
            inner.with_context(|context| context.with_mode(mode)).run().boxed()
        }))
    }

    /// Once more than `limit` tests of the subtree have failed, every
    /// further test fails with [`FailingFast`] instead of running, which
    /// aborts the run.
    pub fn fail_fast(limit: usize) -> Self {
        Self::from_wrapping(Arc::new(move |_: Arc<ElementInfo>, inner: Inner| {
            let traversal = fail_fast_traversal(limit);
            inner
                .with_context(|context| context.with_traversal(traversal))
                .run()
                .boxed()
        }))
    }

    /// Fails the element if its execution exceeds `limit`. The subtree
    /// is cancelled at the limit and the element finishes once every
    /// element below it has.
    pub fn timeout(limit: Duration) -> Self {
        Self::wrapping(move |element, inner| async move {
            match inner.run_until(tokio::time::sleep(limit)).await {
                Some(result) => result,
                None => {
                    warn!("{} exceeded {:?}, cancelled", element, limit);
                    Err(TimedOut {
                        path: element.path.clone(),
                        limit,
                    }
                    .into())
                }
            }
        })
    }

    /// Adds `report` for the subtree's events.
    pub fn additional_report(report: Arc<dyn ReportSink>) -> Self {
        Self::from_report_setup(Arc::new(move |_: &ElementInfo| report.clone()))
    }

    /// Adds the sink produced by `setup` for the subtree's events.
    pub fn report_setup<F>(setup: F) -> Self
    where
        F: Fn(&ElementInfo) -> Arc<dyn ReportSink> + Send + Sync + 'static,
    {
        Self::from_report_setup(Arc::new(setup))
    }

    /// Claims the process-wide primary execution resource for the
    /// subtree. Children inside run sequentially. Claiming it while
    /// another subtree holds it is a configuration error.
    pub fn primary_resource() -> Self {
        Self::wrapping(|element, inner| async move {
            let claim = PrimaryResource::claim(&element.path)?;
            let result = inner
                .with_context(|context| context.with_mode(InvocationMode::Sequential))
                .run()
                .await;
            drop(claim);
            result
        })
    }
}

/// A fresh failure counter for one attachment of `fail_fast`.
fn fail_fast_traversal(limit: usize) -> WrappingAction {
    let failures = Arc::new(AtomicUsize::new(0));
    Arc::new(move |element: Arc<ElementInfo>, inner: Inner| {
        let failures = failures.clone();
        async move {
            if element.kind != ElementKind::Test {
                return inner.run().await;
            }
            let count = failures.load(Ordering::SeqCst);
            if count > limit {
                warn!("Failing fast at {} after {} failures", element, count);
                return Err(FailingFast {
                    failures: count,
                    limit,
                }
                .into());
            }
            let result = inner.run().await;
            if let Err(error) = &result {
                if Failure::kind_of(error) == FailureKind::Test {
                    failures.fetch_add(1, Ordering::SeqCst);
                }
            }
            result
        }
        .boxed()
    })
}

fn boxed<F, Fut>(action: F) -> WrappingAction
where
    F: Fn(Arc<ElementInfo>, Inner) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |element, inner| action(element, inner).boxed())
}
