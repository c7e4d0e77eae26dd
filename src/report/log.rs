//! Tracing report

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::ReportSink;
use crate::models::Event;

/// Logs every event through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReport;

#[async_trait]
impl ReportSink for TracingReport {
    async fn add(&self, event: &Event) {
        match event {
            Event::Starting(starting) => {
                debug!("Starting {} {}", starting.element.kind, starting.element);
            }
            Event::Finished(finished) => {
                let element = &finished.element;
                let elapsed = finished.duration().as_millis();
                match &finished.failure {
                    _ if !element.enabled => {
                        debug!("Skipped {} {} (disabled)", element.kind, element)
                    }
                    None => info!("Finished {} {} [{}ms]", element.kind, element, elapsed),
                    Some(failure) => warn!(
                        "Failed {} {} [{}ms]: {:#}",
                        element.kind, element, elapsed, failure
                    ),
                }
            }
        }
    }
}
