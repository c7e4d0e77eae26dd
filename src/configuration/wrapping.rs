//! Execution wrapping
//!
//! A wrapping action receives the element and an [`Inner`] handle for
//! the execution it encloses. Chains are built innermost first, so the
//! first action of a chain is entered first.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

use crate::error::InnerNotInvoked;
use crate::executor::ExecutionContext;
use crate::models::{ElementInfo, Failure, FailureKind};

/// The execution enclosed by a wrapper
pub(crate) type Next =
    Box<dyn FnOnce(ExecutionContext) -> BoxFuture<'static, Result<(), Failure>> + Send>;

/// Handle to the inner action of a wrapper
pub struct Inner {
    element: Arc<ElementInfo>,
    context: ExecutionContext,
    next: Next,
    state: Arc<InnerState>,
}

#[derive(Default)]
struct InnerState {
    invoked: AtomicBool,
    aborting: Mutex<Option<Failure>>,
}

impl Inner {
    pub fn element(&self) -> &ElementInfo {
        &self.element
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Replace the context the inner action will run with.
    pub fn with_context(mut self, f: impl FnOnce(ExecutionContext) -> ExecutionContext) -> Self {
        self.context = f(self.context);
        self
    }

    /// Run the inner action.
    pub async fn run(self) -> anyhow::Result<()> {
        self.state.invoked.store(true, Ordering::SeqCst);
        let result = (self.next)(self.context).await;
        self.state.settle(result)
    }

    /// Run the inner action until `stop` completes first. The enclosed
    /// subtree is then cancelled and awaited, so every element in it
    /// still finishes.
    ///
    /// Returns `None` when `stop` won. Cancellations caused by `stop`
    /// are not reported as aborts.
    pub(crate) async fn run_until(
        self,
        stop: impl Future<Output = ()>,
    ) -> Option<anyhow::Result<()>> {
        let outer = self.context.cancellation().clone();
        let stopped = outer.child_token();
        let Inner {
            context,
            next,
            state,
            ..
        } = self;

        state.invoked.store(true, Ordering::SeqCst);
        let mut run = next(context.with_cancellation(stopped.clone()));
        tokio::select! {
            biased;
            result = &mut run => return Some(state.settle(result)),
            _ = stop => stopped.cancel(),
        }

        match run.await {
            Err(failure) if failure.kind() == FailureKind::Cancelled && !outer.is_cancelled() => {
                None
            }
            Err(failure) if failure.aborts_run() => Some(state.settle(Err(failure))),
            _ => None,
        }
    }
}

impl InnerState {
    /// Remember an aborting failure so the wrapper cannot swallow it.
    fn settle(&self, result: Result<(), Failure>) -> anyhow::Result<()> {
        result.map_err(|failure| {
            if failure.aborts_run() {
                *self.aborting.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure.clone());
            }
            failure.into_error()
        })
    }
}

/// Enclose `next` in `action`.
///
/// A wrapper returning `Ok` after its inner action aborted gets the
/// aborting failure back; one returning `Ok` without ever running its
/// inner action fails with [`InnerNotInvoked`].
pub(crate) fn wrap(action: super::WrappingAction, element: Arc<ElementInfo>, next: Next) -> Next {
    Box::new(move |context| {
        let state = Arc::new(InnerState::default());
        let inner = Inner {
            element: element.clone(),
            context,
            next,
            state: state.clone(),
        };
        async move {
            let result = action(element.clone(), inner).await;
            let aborting = state
                .aborting
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();

            match result {
                Ok(()) => {
                    if let Some(failure) = aborting {
                        warn!(
                            "Wrapper of {} swallowed an aborting failure, re-raising: {}",
                            element, failure
                        );
                        return Err(failure);
                    }
                    if !state.invoked.load(Ordering::SeqCst) {
                        return Err(Failure::new(
                            InnerNotInvoked {
                                path: element.path.clone(),
                            }
                            .into(),
                        ));
                    }
                    Ok(())
                }
                Err(error) => {
                    let failure = Failure::new(error);
                    match aborting {
                        Some(aborting) if !failure.aborts_run() => {
                            Err(aborting.with_suppressed(failure))
                        }
                        _ => Err(failure),
                    }
                }
            }
        }
        .boxed()
    })
}

/// Build a chain from `actions`, outermost first, around `body`.
pub(crate) fn chain(actions: Vec<super::WrappingAction>, element: &Arc<ElementInfo>, body: Next) -> Next {
    actions
        .into_iter()
        .rev()
        .fold(body, |next, action| wrap(action, element.clone(), next))
}
