//! Execution context
//!
//! The immutable state threaded through the traversal: invocation mode,
//! active report sinks, traversal wrappers and the cancellation token.
//! Wrappers derive a new context for the subtree they enclose; nothing
//! is shared through ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::configuration::WrappingAction;
use crate::models::{ElementInfo, Event, Failure, FinishedEvent, StartingEvent};
use crate::report::ReportSink;

/// How a suite runs its children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    /// One after another, in declaration order
    #[default]
    Sequential,
    /// One task per child, all awaited before the suite finishes
    Concurrent,
}

impl InvocationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Some(InvocationMode::Sequential),
            "concurrent" | "parallel" => Some(InvocationMode::Concurrent),
            _ => None,
        }
    }
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationMode::Sequential => write!(f, "sequential"),
            InvocationMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

#[derive(Clone)]
pub struct ExecutionContext {
    mode: InvocationMode,
    reports: Vec<Arc<dyn ReportSink>>,
    traversals: Vec<WrappingAction>,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new(report: Arc<dyn ReportSink>, cancellation: CancellationToken) -> Self {
        Self {
            mode: InvocationMode::default(),
            reports: vec![report],
            traversals: Vec::new(),
            cancellation,
        }
    }

    pub fn mode(&self) -> InvocationMode {
        self.mode
    }

    pub fn with_mode(mut self, mode: InvocationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds a sink receiving every event of the enclosed subtree.
    pub fn with_report(mut self, report: Arc<dyn ReportSink>) -> Self {
        self.reports.push(report);
        self
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    /// Installs a wrapper applied to every element of the enclosed subtree.
    /// Earlier installations wrap later ones.
    pub fn with_traversal(mut self, traversal: WrappingAction) -> Self {
        self.traversals.push(traversal);
        self
    }

    pub fn traversals(&self) -> &[WrappingAction] {
        &self.traversals
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Sinks receive `Starting` in attachment order.
    pub(crate) async fn emit_starting(&self, element: &Arc<ElementInfo>) -> Arc<StartingEvent> {
        let starting = Arc::new(StartingEvent::new(element.clone()));
        let event = Event::Starting(starting.clone());
        for report in &self.reports {
            report.add(&event).await;
        }
        starting
    }

    /// Sinks receive `Finished` in reverse attachment order.
    pub(crate) async fn emit_finished(&self, starting: Arc<StartingEvent>, failure: Option<Failure>) {
        let event = Event::Finished(Arc::new(FinishedEvent::new(starting, failure)));
        for report in self.reports.iter().rev() {
            report.add(&event).await;
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("mode", &self.mode)
            .field("reports", &self.reports.len())
            .field("traversals", &self.traversals.len())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}
