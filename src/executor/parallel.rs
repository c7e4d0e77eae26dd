//! Child dispatch
//!
//! A suite runs its children either in declaration order or as one task
//! per child, awaiting all of them before it finishes. A session always
//! runs its compartments one after another.

use anyhow::anyhow;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::context::{ExecutionContext, InvocationMode};
use super::runner::{execute_node, Node};
use crate::error::{Cancelled, Panicked};
use crate::models::{ElementInfo, ElementKind, Failure, FailureKind};
use crate::tree::TestElement;

pub(crate) async fn run_children(
    node: &Node,
    element: &ElementInfo,
    context: ExecutionContext,
) -> Result<(), Failure> {
    let Some(suite) = node.suite() else {
        return Ok(());
    };
    let mode = if element.kind == ElementKind::Session {
        InvocationMode::Sequential
    } else {
        context.mode()
    };
    debug!(
        "{} runs {} children {}",
        element,
        suite.children().len(),
        mode
    );

    match mode {
        InvocationMode::Sequential => run_sequential(suite.children(), element, context).await,
        InvocationMode::Concurrent => run_concurrent(suite.children(), element, context).await,
    }
}

async fn run_sequential(
    children: &[Arc<TestElement>],
    element: &ElementInfo,
    context: ExecutionContext,
) -> Result<(), Failure> {
    for child in children {
        if context.is_cancelled() {
            return Err(Failure::new(
                Cancelled {
                    path: element.path.clone(),
                }
                .into(),
            ));
        }
        execute_node(Node::Element(child.clone()), context.clone()).await?;
    }
    Ok(())
}

/// Spawn every child, then drain all of them. The first abort cancels
/// the remaining siblings.
async fn run_concurrent(
    children: &[Arc<TestElement>],
    element: &ElementInfo,
    context: ExecutionContext,
) -> Result<(), Failure> {
    let siblings = context.cancellation().child_token();
    let child_context = context.with_cancellation(siblings.clone());

    let mut tasks = JoinSet::new();
    for child in children {
        tasks.spawn(execute_node(Node::Element(child.clone()), child_context.clone()));
    }

    let mut aborts = Vec::new();
    let mut lost = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => {
                if aborts.is_empty() {
                    warn!("{} aborting, cancelling siblings: {}", element, failure);
                    siblings.cancel();
                }
                aborts.push(failure);
            }
            Err(join_error) => {
                error!("Child task of {} did not complete: {}", element, join_error);
                let error = if join_error.is_panic() {
                    Panicked::from_payload(&element.path, join_error.into_panic()).into()
                } else {
                    anyhow!("child task of {} did not complete: {}", element, join_error)
                };
                lost.get_or_insert_with(|| Failure::new(error));
            }
        }
    }

    match (first_cause(aborts), lost) {
        (Some(cause), _) => Err(cause),
        // a child that never finished fails its suite
        (None, Some(failure)) => Err(failure),
        (None, None) => Ok(()),
    }
}

/// The abort that caused the others: the first one that is not a
/// cancellation, else the first one.
fn first_cause(mut aborts: Vec<Failure>) -> Option<Failure> {
    let position = aborts
        .iter()
        .position(|failure| failure.kind() != FailureKind::Cancelled)
        .unwrap_or(0);
    if aborts.is_empty() {
        None
    } else {
        Some(aborts.swap_remove(position))
    }
}
