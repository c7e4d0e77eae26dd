//! JSON lines report
//!
//! Writes one [`EventRecord`](crate::models::EventRecord) per line, the
//! structured log consumed by host-runner adapters.

use async_trait::async_trait;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use super::ReportSink;
use crate::models::Event;

pub struct JsonLinesReport<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesReport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> ReportSink for JsonLinesReport<W> {
    async fn add(&self, event: &Event) {
        let line = match serde_json::to_string(&event.to_record()) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize event for {}: {}", event.element(), e);
                return;
            }
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}") {
            warn!("Failed to write event record: {}", e);
        }
    }
}
