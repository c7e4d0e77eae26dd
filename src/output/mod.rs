//! Output formatting module
//!
//! Renders run summaries for harness binaries.

mod formatter;

pub use formatter::{write_summary_to_file, OutputFormat, ResultFormatter};
