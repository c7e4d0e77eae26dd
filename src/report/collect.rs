//! In-memory report

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use super::ReportSink;
use crate::models::{Event, FinishedEvent};

/// Keeps every received event, in arrival order
#[derive(Debug, Default)]
pub struct CollectingReport {
    events: Mutex<Vec<Event>>,
}

impl CollectingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn finished(&self) -> Vec<Arc<FinishedEvent>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(f) => Some(f),
                Event::Starting(_) => None,
            })
            .collect()
    }

    /// Finished event of the element at `path`, if one was received
    pub fn finished_for(&self, path: &str) -> Option<Arc<FinishedEvent>> {
        self.finished()
            .into_iter()
            .find(|f| f.element.path == path)
    }

    /// One line per event: `+path` for starting, `-path` for finished,
    /// with `!` and the failure message appended to failed elements.
    pub fn trace(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|event| match event {
                Event::Starting(s) => format!("+{}", s.element),
                Event::Finished(f) => match &f.failure {
                    None => format!("-{}", f.element),
                    Some(failure) => format!("-{} ! {}", f.element, failure),
                },
            })
            .collect()
    }
}

#[async_trait]
impl ReportSink for CollectingReport {
    async fn add(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
