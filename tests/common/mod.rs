#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use testtree::models::Event;
use testtree::{CollectingReport, HarnessSettings, ReportSink, RunReport, SessionBuilder, TestRun};

/// Ordered log shared between test actions, fixtures and sinks
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Writes `label:+path` and `label:-path` lines into a shared log
pub struct LabelledReport {
    pub label: &'static str,
    pub log: Log,
}

#[async_trait]
impl ReportSink for LabelledReport {
    async fn add(&self, event: &Event) {
        let sign = if event.is_starting() { '+' } else { '-' };
        self.log
            .push(format!("{}:{}{}", self.label, sign, event.element()));
    }
}

/// Declare and run a session, collecting every event.
pub async fn run_collecting<F>(settings: HarnessSettings, declare: F) -> (Arc<CollectingReport>, RunReport)
where
    F: FnOnce(&mut SessionBuilder<'_>),
{
    let mut run = TestRun::new(settings);
    run.session(declare).unwrap();
    let collected = Arc::new(CollectingReport::new());
    let report = run.run(Some(collected.clone())).await.unwrap();
    (collected, report)
}

/// Paths of the tests that finished, in order
pub fn finished_tests(collected: &CollectingReport) -> Vec<String> {
    collected
        .finished()
        .iter()
        .filter(|f| f.element.is_test())
        .map(|f| f.element.path.clone())
        .collect()
}
