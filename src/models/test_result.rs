//! Test result models
//!
//! Per-test records and the run summary built from finished events.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FailureKind, FinishedEvent};

/// Outcome of a single test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Fail,
    /// Disabled or deselected; reported without running
    Skip,
    FailingFast,
    Cancelled,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
            TestStatus::FailingFast => "»",
            TestStatus::Cancelled => "-",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }

    pub fn from_finished(event: &FinishedEvent) -> Self {
        if !event.element.enabled {
            return TestStatus::Skip;
        }
        match &event.failure {
            None => TestStatus::Pass,
            Some(failure) => match failure.kind() {
                FailureKind::FailingFast => TestStatus::FailingFast,
                FailureKind::Cancelled => TestStatus::Cancelled,
                FailureKind::Test | FailureKind::Configuration => TestStatus::Fail,
            },
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::FailingFast => write!(f, "FAST"),
            TestStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Result of a single test (or of a failed suite)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub path: String,
    pub display_name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<String>,
}

impl TestRecord {
    pub fn from_finished(event: &FinishedEvent) -> Self {
        Self {
            path: event.element.path.clone(),
            display_name: event.element.display_name.clone(),
            status: TestStatus::from_finished(event),
            duration_ms: event.duration().as_millis() as u64,
            message: event.failure.as_ref().map(|f| f.message()),
            suppressed: event
                .failure
                .as_ref()
                .map(|f| f.suppressed().iter().map(|s| s.message()).collect())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.path,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failing_fast: usize,
    pub cancelled: usize,
    /// Suites (and compartments) whose own body or teardown failed
    pub suite_failures: usize,
    pub total_duration_ms: u64,
    pub tests: Vec<TestRecord>,
    pub suites: Vec<TestRecord>,
}

impl RunSummary {
    pub fn new(tests: Vec<TestRecord>, suites: Vec<TestRecord>, total_duration_ms: u64) -> Self {
        let count = |status: TestStatus| tests.iter().filter(|r| r.status == status).count();

        Self {
            total: tests.len(),
            passed: count(TestStatus::Pass),
            failed: count(TestStatus::Fail),
            skipped: count(TestStatus::Skip),
            failing_fast: count(TestStatus::FailingFast),
            cancelled: count(TestStatus::Cancelled),
            suite_failures: suites.len(),
            total_duration_ms,
            tests,
            suites,
        }
    }

    /// Genuine failures: failed tests plus failed suites.
    /// Fail-fast short circuits and cancellations are not counted.
    pub fn failures(&self) -> usize {
        self.failed + self.suite_failures
    }

    pub fn pass_rate(&self) -> f64 {
        let executed = self.total - self.skipped;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.failures() == 0 && self.failing_fast == 0 && self.cancelled == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for record in &self.tests {
            writeln!(f, "  {record}")?;
        }
        for record in &self.suites {
            writeln!(f, "  {record}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Suite failures: {}",
            self.total, self.passed, self.failed, self.skipped, self.suite_failures
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}
