//! Summary report
//!
//! Turns finished events into [`TestRecord`]s and a [`RunSummary`].

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use super::ReportSink;
use crate::models::{Event, RunSummary, TestRecord, TestStatus};

#[derive(Debug)]
pub struct SummaryReport {
    state: Mutex<SummaryState>,
    started: Instant,
}

#[derive(Debug, Default)]
struct SummaryState {
    tests: Vec<TestRecord>,
    suites: Vec<TestRecord>,
}

impl SummaryReport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SummaryState::default()),
            started: Instant::now(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        RunSummary::new(
            state.tests.clone(),
            state.suites.clone(),
            self.started.elapsed().as_millis() as u64,
        )
    }
}

impl Default for SummaryReport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for SummaryReport {
    async fn add(&self, event: &Event) {
        let Event::Finished(finished) = event else {
            return;
        };
        let record = TestRecord::from_finished(finished);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if finished.element.is_test() {
            state.tests.push(record);
        } else if record.status == TestStatus::Fail {
            // Aborts and cancellations surface on every enclosing suite;
            // only genuine suite failures are kept.
            state.suites.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementInfo, ElementKind, Failure, FinishedEvent, StartingEvent};
    use anyhow::anyhow;
    use std::sync::Arc;

    fn finished(path: &str, kind: ElementKind, enabled: bool, failure: Option<Failure>) -> Event {
        let element = Arc::new(ElementInfo {
            name: path.into(),
            display_name: path.into(),
            path: path.into(),
            parent: None,
            kind,
            enabled,
        });
        let starting = Arc::new(StartingEvent::new(element));
        Event::Finished(Arc::new(FinishedEvent::new(starting, failure)))
    }

    #[tokio::test]
    async fn test_summary_from_events() {
        let report = SummaryReport::new();
        report
            .add(&finished("s.ok", ElementKind::Test, true, None))
            .await;
        report
            .add(&finished(
                "s.bad",
                ElementKind::Test,
                true,
                Some(Failure::new(anyhow!("bad"))),
            ))
            .await;
        report
            .add(&finished("s.off", ElementKind::Test, false, None))
            .await;
        report
            .add(&finished(
                "s",
                ElementKind::Suite,
                true,
                Some(Failure::new(anyhow!("teardown"))),
            ))
            .await;

        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.suite_failures, 1);
        assert_eq!(summary.failures(), 2);
    }
}
