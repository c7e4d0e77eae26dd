//! Element execution
//!
//! Runs one element: report setup, Starting event, the wrapping chain
//! around the element's body, Finished event. Ordinary failures end at
//! the element that raised them; aborting failures keep propagating.

use anyhow::anyhow;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::context::ExecutionContext;
use super::parallel;
use crate::configuration::{chain, Next, WrappingAction};
use crate::error::{Cancelled, EngineError, Panicked};
use crate::fixture::FixtureRegistry;
use crate::models::{ElementInfo, Failure};
use crate::report::ReportSink;
use crate::tree::{ElementCore, Session, Suite, TestAction, TestElement, TestScope};

/// An executable node: the session root or an element below it
#[derive(Clone)]
pub(crate) enum Node {
    Session(Arc<Session>),
    Element(Arc<TestElement>),
}

impl Node {
    pub(crate) fn core(&self) -> &ElementCore {
        match self {
            Node::Session(session) => session.root().core(),
            Node::Element(element) => element.core(),
        }
    }

    pub(crate) fn suite(&self) -> Option<&Suite> {
        match self {
            Node::Session(session) => Some(session.root()),
            Node::Element(element) => element.as_suite(),
        }
    }

    fn action(&self) -> Option<TestAction> {
        match self {
            Node::Element(element) => match element.as_ref() {
                TestElement::Test(test) => Some(test.action()),
                TestElement::Suite(_) => None,
            },
            Node::Session(_) => None,
        }
    }
}

/// Run a parameterized session to completion.
///
/// Returns normally when every failure was recovered where it happened,
/// [`EngineError::Aborted`] when an aborting failure reached the session.
pub async fn execute(
    session: Arc<Session>,
    report: Arc<dyn ReportSink>,
    cancellation: CancellationToken,
) -> Result<(), EngineError> {
    let context = ExecutionContext::new(report, cancellation);
    let start = Instant::now();
    info!("Executing session");

    match execute_node(Node::Session(session), context).await {
        Ok(()) => {
            info!("Session completed in {}ms", start.elapsed().as_millis());
            Ok(())
        }
        Err(cause) => {
            error!(
                "Session aborted after {}ms: {:#}",
                start.elapsed().as_millis(),
                cause
            );
            Err(EngineError::Aborted { cause })
        }
    }
}

/// Execute `node` and its subtree, emitting one Starting and one
/// Finished event for every element that starts.
pub(crate) fn execute_node(
    node: Node,
    context: ExecutionContext,
) -> BoxFuture<'static, Result<(), Failure>> {
    async move {
        let element = Arc::new(node.core().info());
        let mut context = context;
        let mut setup_failure = None;
        for setup in node.core().configuration().report_setups() {
            match std::panic::catch_unwind(AssertUnwindSafe(|| setup(&element))) {
                Ok(report) => context = context.with_report(report),
                Err(payload) => {
                    setup_failure = Some(panicked(&element, payload));
                    break;
                }
            }
        }

        let starting = context.emit_starting(&element).await;
        let result = match setup_failure {
            Some(failure) => Err(failure),
            None if element.enabled => run_enabled(&node, &element, context.clone()).await,
            None => run_disabled(&node, &context).await,
        };

        let failure = result.err();
        match &failure {
            Some(failure) => debug!("{} failed ({}): {}", element, failure.kind(), failure),
            None => debug!("{} finished", element),
        }
        context.emit_finished(starting, failure.clone()).await;

        match failure {
            Some(failure) if failure.aborts_run() => Err(failure),
            _ => Ok(()),
        }
    }
    .boxed()
}

/// Disabled elements are reported without running anything of theirs.
async fn run_disabled(node: &Node, context: &ExecutionContext) -> Result<(), Failure> {
    if let Some(suite) = node.suite() {
        for child in suite.children() {
            execute_node(Node::Element(child.clone()), context.clone()).await?;
        }
    }
    Ok(())
}

async fn run_enabled(
    node: &Node,
    element: &Arc<ElementInfo>,
    context: ExecutionContext,
) -> Result<(), Failure> {
    let mut actions: Vec<WrappingAction> = context.traversals().to_vec();
    actions.extend(node.core().configuration().wrapping_actions().iter().cloned());

    match node.suite() {
        Some(suite) => {
            let fixtures = suite.fixtures().clone();
            fixtures.open();
            let body = suite_body(node.clone(), element.clone(), fixtures.clone());
            let run = chain(actions, element, body)(context);
            let result = unwinding_into_failure(element, run).await;
            if fixtures.is_active() {
                // the body never ran, close what the wrappers created
                return close_fixtures(fixtures, result.err()).await;
            }
            result
        }
        None => match node.action() {
            Some(action) => {
                let body = test_body(action, element.clone());
                let run = chain(actions, element, body)(context);
                unwinding_into_failure(element, run).await
            }
            None => Err(Failure::new(anyhow!("{} has no test action", element))),
        },
    }
}

/// A panic in a wrapping action fails the element instead of unwinding
/// through its ancestors.
async fn unwinding_into_failure(
    element: &ElementInfo,
    run: BoxFuture<'static, Result<(), Failure>>,
) -> Result<(), Failure> {
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panicked(element, payload)),
    }
}

fn panicked(element: &ElementInfo, payload: Box<dyn std::any::Any + Send>) -> Failure {
    Failure::new(Panicked::from_payload(&element.path, payload).into())
}

fn suite_body(node: Node, element: Arc<ElementInfo>, fixtures: Arc<FixtureRegistry>) -> Next {
    Box::new(move |context| {
        async move {
            let result = parallel::run_children(&node, &element, context).await;
            close_fixtures(fixtures, result.err()).await
        }
        .boxed()
    })
}

/// Tear down the suite's fixtures on a task of their own, so a dropped
/// or cancelled suite still releases them.
async fn close_fixtures(
    fixtures: Arc<FixtureRegistry>,
    primary: Option<Failure>,
) -> Result<(), Failure> {
    let suite = fixtures.suite().to_string();
    if !fixtures.is_empty() {
        debug!("Closing {} fixture(s) of '{}'", fixtures.len(), suite);
    }
    let teardown = tokio::spawn(async move { fixtures.tear_down(primary).await });
    match teardown.await {
        Ok(None) => Ok(()),
        Ok(Some(failure)) => Err(failure),
        Err(join_error) => Err(Failure::new(anyhow!(
            "fixture teardown of '{}' did not complete: {}",
            suite,
            join_error
        ))),
    }
}

fn test_body(action: TestAction, element: Arc<ElementInfo>) -> Next {
    Box::new(move |context: ExecutionContext| {
        async move {
            let cancelled = || {
                Failure::new(
                    Cancelled {
                        path: element.path.clone(),
                    }
                    .into(),
                )
            };
            if context.is_cancelled() {
                return Err(cancelled());
            }

            let token = context.cancellation().clone();
            let scope = TestScope::new(element.clone(), context);
            let run = AssertUnwindSafe(async move { action(scope).await }).catch_unwind();

            tokio::select! {
                biased;
                _ = token.cancelled() => Err(cancelled()),
                outcome = run => match outcome {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(error)) => Err(Failure::new(error)),
                    Err(payload) => Err(panicked(&element, payload)),
                },
            }
        }
        .boxed()
    })
}
