//! Lifecycle events
//!
//! Every element that takes part in a run produces exactly one
//! [`StartingEvent`] followed by one [`FinishedEvent`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ElementInfo, ElementKind, Failure, FailureKind};

#[derive(Debug)]
pub struct StartingEvent {
    pub element: Arc<ElementInfo>,
    pub at: DateTime<Utc>,
    instant: Instant,
}

impl StartingEvent {
    pub fn new(element: Arc<ElementInfo>) -> Self {
        Self {
            element,
            at: Utc::now(),
            instant: Instant::now(),
        }
    }
}

#[derive(Debug)]
pub struct FinishedEvent {
    pub element: Arc<ElementInfo>,
    pub starting: Arc<StartingEvent>,
    pub failure: Option<Failure>,
    pub at: DateTime<Utc>,
    duration: Duration,
}

impl FinishedEvent {
    pub fn new(starting: Arc<StartingEvent>, failure: Option<Failure>) -> Self {
        Self {
            element: starting.element.clone(),
            duration: starting.instant.elapsed(),
            starting,
            failure,
            at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// An event delivered to report sinks
#[derive(Clone, Debug)]
pub enum Event {
    Starting(Arc<StartingEvent>),
    Finished(Arc<FinishedEvent>),
}

impl Event {
    pub fn element(&self) -> &ElementInfo {
        match self {
            Event::Starting(e) => &e.element,
            Event::Finished(e) => &e.element,
        }
    }

    pub fn is_starting(&self) -> bool {
        matches!(self, Event::Starting(_))
    }

    /// Flat, serializable view of the event
    pub fn to_record(&self) -> EventRecord {
        let element = self.element();
        let mut record = EventRecord {
            event: if self.is_starting() { "starting" } else { "finished" },
            path: element.path.clone(),
            display_name: element.display_name.clone(),
            kind: element.kind,
            enabled: element.enabled,
            at: match self {
                Event::Starting(e) => e.at,
                Event::Finished(e) => e.at,
            },
            duration_ms: None,
            failure: None,
            failure_kind: None,
            suppressed: Vec::new(),
        };
        if let Event::Finished(finished) = self {
            record.duration_ms = Some(finished.duration.as_millis() as u64);
            if let Some(failure) = &finished.failure {
                record.failure = Some(failure.message());
                record.failure_kind = Some(failure.kind());
                record.suppressed = failure.suppressed().iter().map(|s| s.message()).collect();
            }
        }
        record
    }
}

/// JSON-friendly event representation
#[derive(Clone, Debug, Serialize)]
pub struct EventRecord {
    pub event: &'static str,
    pub path: String,
    pub display_name: String,
    pub kind: ElementKind,
    pub enabled: bool,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn element() -> Arc<ElementInfo> {
        Arc::new(ElementInfo {
            name: "add".into(),
            display_name: "add".into(),
            path: "calc.add".into(),
            parent: Some("calc".into()),
            kind: ElementKind::Test,
            enabled: true,
        })
    }

    #[test]
    fn test_finished_outcome() {
        let starting = Arc::new(StartingEvent::new(element()));
        let ok = FinishedEvent::new(starting.clone(), None);
        assert!(ok.succeeded());

        let failed = FinishedEvent::new(starting, Some(Failure::new(anyhow!("nope"))));
        assert!(failed.failed());
    }

    #[test]
    fn test_record_serialization() {
        let starting = Arc::new(StartingEvent::new(element()));
        let failure = Failure::new(anyhow!("primary"))
            .with_suppressed(Failure::new(anyhow!("secondary")));
        let event = Event::Finished(Arc::new(FinishedEvent::new(starting, Some(failure))));

        let json = serde_json::to_value(event.to_record()).unwrap();
        assert_eq!(json["event"], "finished");
        assert_eq!(json["path"], "calc.add");
        assert_eq!(json["failure"], "primary");
        assert_eq!(json["failure_kind"], "test");
        assert_eq!(json["suppressed"][0], "secondary");
    }
}
