//! Output formatters for run results
//!
//! Renders a [`RunSummary`] as a grouped table, JSON, CSV or a single
//! summary line.

use std::fmt;
use std::path::Path;

use crate::models::{RunSummary, TestRecord, TestStatus, PATH_SEPARATOR};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 5] = ["table", "json", "json-pretty", "csv", "summary"];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            "json-pretty" | "jsonpretty" => Some(Self::JsonPretty),
            "csv" => Some(Self::Csv),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => Self::NAMES[0],
            Self::Json => Self::NAMES[1],
            Self::JsonPretty => Self::NAMES[2],
            Self::Csv => Self::NAMES[3],
            Self::Summary => Self::NAMES[4],
        };
        f.write_str(name)
    }
}

pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(self) -> Self {
        Self {
            colorize: false,
            ..self
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colorize {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn format_record(&self, record: &TestRecord) -> String {
        match self.format {
            OutputFormat::Table => self.record_line(record, &record.path),
            OutputFormat::Json => serde_json::to_string(record).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(record).unwrap_or_default(),
            OutputFormat::Csv => csv_row(record),
            OutputFormat::Summary => record.to_string(),
        }
    }

    /// One status line, followed by the failure message and any
    /// suppressed failures.
    fn record_line(&self, record: &TestRecord, label: &str) -> String {
        let code = match record.status {
            TestStatus::Pass => "32",
            TestStatus::Fail => "31",
            TestStatus::Skip | TestStatus::Cancelled => "33",
            TestStatus::FailingFast => "35",
        };
        let status = format!("{} {:<9}", record.status.symbol(), record.status);
        let mut line = format!(
            "{} {:<40} {:>6}ms",
            self.paint(code, &status),
            label,
            record.duration_ms
        );
        if let Some(message) = &record.message {
            line.push_str(&format!("\n    {message}"));
        }
        for suppressed in &record.suppressed {
            line.push_str(&format!("\n    suppressed: {suppressed}"));
        }
        line
    }

    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => summary_csv(summary),
            OutputFormat::Summary => summary_line(summary),
        }
    }

    /// Tests grouped under their suite's path, in reporting order, then
    /// failed suites, then the totals.
    fn summary_table(&self, summary: &RunSummary) -> String {
        let mut lines = Vec::new();
        let mut current_suite: Option<&str> = None;

        for record in &summary.tests {
            let (suite, name) = record
                .path
                .rsplit_once(PATH_SEPARATOR)
                .unwrap_or(("", record.path.as_str()));
            if current_suite != Some(suite) {
                lines.push(self.paint("1", if suite.is_empty() { "(top level)" } else { suite }));
                current_suite = Some(suite);
            }
            lines.push(format!("  {}", self.record_line(record, name)));
        }

        if !summary.suites.is_empty() {
            lines.push(self.paint("1", "Failed suites"));
            for record in &summary.suites {
                lines.push(format!("  {}", self.record_line(record, &record.path)));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Total {} | {} | {} | skipped {} | failing fast {} | cancelled {}",
            summary.total,
            self.paint("32", &format!("passed {}", summary.passed)),
            self.paint(
                if summary.failures() > 0 { "31" } else { "0" },
                &format!("failed {}", summary.failed)
            ),
            summary.skipped,
            summary.failing_fast,
            summary.cancelled
        ));
        lines.push(format!(
            "Suite failures {} | pass rate {:.1}% | {}ms",
            summary.suite_failures,
            summary.pass_rate(),
            summary.total_duration_ms
        ));
        lines.join("\n")
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn csv_row(record: &TestRecord) -> String {
    let quoted = |s: &str| format!("\"{}\"", s.replace('"', "\"\""));
    [
        quoted(&record.path),
        quoted(&record.display_name),
        record.status.to_string(),
        record.duration_ms.to_string(),
        quoted(record.message.as_deref().unwrap_or("")),
    ]
    .join(",")
}

fn summary_csv(summary: &RunSummary) -> String {
    std::iter::once("path,display_name,status,duration_ms,message".to_string())
        .chain(summary.tests.iter().chain(&summary.suites).map(csv_row))
        .map(|line| line + "\n")
        .collect()
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{}/{} passed ({:.1}%), {} failed, {} skipped in {}ms",
        summary.passed,
        summary.total - summary.skipped,
        summary.pass_rate(),
        summary.failures(),
        summary.skipped,
        summary.total_duration_ms
    )
}

/// Write an uncolored summary to `path`.
pub fn write_summary_to_file(
    path: impl AsRef<Path>,
    summary: &RunSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let content = ResultFormatter::new(format).no_color().format_summary(summary);
    std::fs::write(path, content)?;
    Ok(())
}
