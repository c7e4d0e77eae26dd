//! Data models
//!
//! Element descriptors, lifecycle events, failures and result summaries.

mod element;
mod event;
mod failure;
mod test_result;

pub use element::{ElementInfo, ElementKind, COMPARTMENT_MARKER, PATH_SEPARATOR};
pub use event::{Event, EventRecord, FinishedEvent, StartingEvent};
pub use failure::{Failure, FailureKind};
pub use test_result::{RunSummary, TestRecord, TestStatus};
