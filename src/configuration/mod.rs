//! Configuration algebra
//!
//! A [`Configuration`] is an immutable value made of three independent
//! action kinds:
//!
//! - **parameterizing** actions run once per element while the tree is
//!   parameterized and may change its enabled state or display name
//! - **wrapping** actions enclose the element's execution and run once
//!   per element execution
//! - **report setup** actions add report sinks for the element's subtree
//!
//! `a.chained_with(&b)` concatenates each kind independently, keeping
//! attachment order: `a`'s parameterizing actions run before `b`'s, `a`'s
//! wrapping encloses `b`'s, and `a`'s sinks are attached before `b`'s.
//!
//! ```no_run
//! use testtree::{Configuration, InvocationMode};
//!
//! let configuration = Configuration::invocation(InvocationMode::Concurrent)
//!     .chained_with(&Configuration::fail_fast(3));
//! ```

use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

use crate::models::ElementInfo;
use crate::report::ReportSink;
use crate::tree::ElementCore;

mod presets;
mod wrapping;

pub use wrapping::Inner;
pub(crate) use wrapping::{chain, Next};

pub type ParameterizingAction = Arc<dyn Fn(&mut ElementCore) + Send + Sync>;

pub type WrappingAction =
    Arc<dyn Fn(Arc<ElementInfo>, Inner) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub type ReportSetupAction = Arc<dyn Fn(&ElementInfo) -> Arc<dyn ReportSink> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Configuration {
    parameterizing: Vec<ParameterizingAction>,
    wrapping: Vec<WrappingAction>,
    report_setup: Vec<ReportSetupAction>,
}

impl Configuration {
    /// The identity of [`chained_with`](Self::chained_with).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parameterizing.is_empty() && self.wrapping.is_empty() && self.report_setup.is_empty()
    }

    /// Combine with `other`, `self` first (and outside).
    pub fn chained_with(&self, other: &Configuration) -> Configuration {
        Configuration {
            parameterizing: concat(&self.parameterizing, &other.parameterizing),
            wrapping: concat(&self.wrapping, &other.wrapping),
            report_setup: concat(&self.report_setup, &other.report_setup),
        }
    }

    pub fn from_parameterizing(action: ParameterizingAction) -> Self {
        Self {
            parameterizing: vec![action],
            ..Self::default()
        }
    }

    pub fn from_wrapping(action: WrappingAction) -> Self {
        Self {
            wrapping: vec![action],
            ..Self::default()
        }
    }

    pub fn from_report_setup(action: ReportSetupAction) -> Self {
        Self {
            report_setup: vec![action],
            ..Self::default()
        }
    }

    pub(crate) fn parameterize(&self, core: &mut ElementCore) {
        for action in &self.parameterizing {
            action(core);
        }
    }

    pub(crate) fn wrapping_actions(&self) -> &[WrappingAction] {
        &self.wrapping
    }

    pub(crate) fn report_setups(&self) -> &[ReportSetupAction] {
        &self.report_setup
    }
}

fn concat<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter().chain(b).cloned().collect()
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("parameterizing", &self.parameterizing.len())
            .field("wrapping", &self.wrapping.len())
            .field("report_setup", &self.report_setup.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailingFast, InnerNotInvoked};
    use crate::executor::ExecutionContext;
    use crate::models::{ElementKind, Failure, FailureKind};
    use crate::report::NullReport;
    use anyhow::anyhow;
    use futures::FutureExt;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    type Log = Arc<Mutex<Vec<String>>>;

    fn element() -> Arc<ElementInfo> {
        Arc::new(ElementInfo {
            name: "t".into(),
            display_name: "t".into(),
            path: "s.t".into(),
            parent: Some("s".into()),
            kind: ElementKind::Test,
            enabled: true,
        })
    }

    fn context() -> ExecutionContext {
        ExecutionContext::new(Arc::new(NullReport), CancellationToken::new())
    }

    fn logging(log: &Log, label: &'static str) -> Configuration {
        let log = log.clone();
        Configuration::wrapping(move |_, inner| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{label} enter"));
                let result = inner.run().await;
                log.lock().unwrap().push(format!("{label} exit"));
                result
            }
        })
    }

    fn body(log: &Log, result: Result<(), Failure>) -> Next {
        let log = log.clone();
        Box::new(move |_| {
            async move {
                log.lock().unwrap().push("body".into());
                result
            }
            .boxed()
        })
    }

    async fn run(configuration: &Configuration, body: Next) -> Result<(), Failure> {
        let element = element();
        chain(configuration.wrapping_actions().to_vec(), &element, body)(context()).await
    }

    #[test]
    fn test_empty_is_identity() {
        let a = Configuration::disabled();
        assert!(Configuration::empty().is_empty());
        assert!(!a.is_empty());

        let left = Configuration::empty().chained_with(&a);
        let right = a.chained_with(&Configuration::empty());
        assert_eq!(left.parameterizing.len(), 1);
        assert_eq!(right.parameterizing.len(), 1);
        assert!(left.wrapping.is_empty() && right.report_setup.is_empty());
    }

    #[tokio::test]
    async fn test_chained_wrapping_nests_first_outside() {
        let log: Log = Arc::default();
        let configuration = logging(&log, "a").chained_with(&logging(&log, "b"));

        run(&configuration, body(&log, Ok(()))).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a enter", "b enter", "body", "b exit", "a exit"]
        );
    }

    #[tokio::test]
    async fn test_chaining_is_associative() {
        let log: Log = Arc::default();
        let left = logging(&log, "a")
            .chained_with(&logging(&log, "b"))
            .chained_with(&logging(&log, "c"));
        run(&left, body(&log, Ok(()))).await.unwrap();
        let left_trace = std::mem::take(&mut *log.lock().unwrap());

        let right =
            logging(&log, "a").chained_with(&logging(&log, "b").chained_with(&logging(&log, "c")));
        run(&right, body(&log, Ok(()))).await.unwrap();

        assert_eq!(left_trace, *log.lock().unwrap());
    }

    #[tokio::test]
    async fn test_wrapper_that_skips_inner_fails() {
        let configuration = Configuration::wrapping(|_, _inner| async { Ok(()) });
        let log: Log = Arc::default();

        let failure = run(&configuration, body(&log, Ok(()))).await.unwrap_err();
        assert!(failure.error().is::<InnerNotInvoked>());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrapper_may_fail_before_entering() {
        let configuration =
            Configuration::wrapping(|_, _inner| async { Err(anyhow!("setup failed")) });
        let log: Log = Arc::default();

        let failure = run(&configuration, body(&log, Ok(()))).await.unwrap_err();
        assert_eq!(failure.message(), "setup failed");
        assert_eq!(failure.kind(), FailureKind::Test);
    }

    #[tokio::test]
    async fn test_swallowed_test_failure_is_muted() {
        let configuration = Configuration::wrapping(|_, inner| async move {
            let _ = inner.run().await;
            Ok(())
        });
        let log: Log = Arc::default();
        let result = run(
            &configuration,
            body(&log, Err(Failure::new(anyhow!("ordinary")))),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_swallowed_abort_is_reraised() {
        let configuration = Configuration::wrapping(|_, inner| async move {
            let _ = inner.run().await;
            Ok(())
        });
        let log: Log = Arc::default();
        let abort = Failure::new(FailingFast { failures: 2, limit: 1 }.into());

        let failure = run(&configuration, body(&log, Err(abort))).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::FailingFast);
    }

    #[tokio::test]
    async fn test_abort_survives_replacing_error() {
        let configuration = Configuration::wrapping(|_, inner| async move {
            let _ = inner.run().await;
            Err(anyhow!("cleanup failed"))
        });
        let log: Log = Arc::default();
        let abort = Failure::new(FailingFast { failures: 2, limit: 1 }.into());

        let failure = run(&configuration, body(&log, Err(abort))).await.unwrap_err();
        assert!(failure.is_failing_fast());
        assert_eq!(failure.suppressed()[0].message(), "cleanup failed");
    }
}
