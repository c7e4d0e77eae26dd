//! Report sinks
//!
//! A report sink receives every [`Event`] of the subtree it is attached
//! to. The engine starts with one sink for the whole run; configurations
//! add further sinks scoped to a subtree.
//!
//! ## Sinks
//!
//! - [`CollectingReport`] keeps events in memory
//! - [`SummaryReport`] builds a [`RunSummary`](crate::models::RunSummary)
//! - [`TracingReport`] logs events through `tracing`
//! - [`JsonLinesReport`] writes one JSON record per event
//! - [`FanOutReport`] forwards to several sinks in order

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::Event;

mod collect;
mod json;
mod log;
mod summary;

pub use collect::CollectingReport;
pub use json::JsonLinesReport;
pub use log::TracingReport;
pub use summary::SummaryReport;

/// Receiver of lifecycle events
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn add(&self, event: &Event);
}

/// Forwards every event to each sink, in attachment order
#[derive(Clone, Default)]
pub struct FanOutReport {
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl FanOutReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl ReportSink for FanOutReport {
    async fn add(&self, event: &Event) {
        for sink in &self.sinks {
            sink.add(event).await;
        }
    }
}

/// Discards all events
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReport;

#[async_trait]
impl ReportSink for NullReport {
    async fn add(&self, _event: &Event) {}
}
