//! Report payload rendering.
//!
//! ## Reporter Trait
//!
//! The orchestrator uses a `Reporter` trait to separate rendering from execution. Each report format is one
//! implementation, selected once at init from a [`ReportFormat`] tag; the orchestrator never branches on the
//! format itself.
//!
//! Payloads are JSON values. The console reporter produces strings, the JSON reporter produces event objects
//! and the JUnit reporter produces one XML document at the end of the run. The `format` label travels with
//! every payload so the host knows how to print it.

mod console;
mod json;
mod junit;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use conductor_core::{RunInfo, TestResult};

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use junit::JunitReporter;

// ============================================================================
// Report Format
// ============================================================================

/// Closed set of payload schemas a runner can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Console,
    Json,
    Junit,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Console, ReportFormat::Json, ReportFormat::Junit];

    /// Parse a format label, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "console" => Some(ReportFormat::Console),
            "json" => Some(ReportFormat::Json),
            "junit" => Some(ReportFormat::Junit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Console => "console",
            ReportFormat::Json => "json",
            ReportFormat::Junit => "junit",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reporter Trait
// ============================================================================

/// Trait for rendering run events into host-consumable payloads.
///
/// Implement this trait to add a report format.
pub trait Reporter: Send {
    /// Label identifying this reporter's payload schema to the host
    fn format(&self) -> ReportFormat;

    /// Called when the host asks for the begin-report. `None` means nothing is emitted.
    fn report_begin(&self, run: &RunInfo) -> Option<Value>;

    /// Called after each test completes. `None` is sent as `null`.
    fn report_complete(&self, result: &TestResult) -> Option<Value>;

    /// Called once with every result the host accumulated.
    fn report_summary(&self, duration: Duration, auto_fail: Option<&str>, results: &[TestResult]) -> Value;
}

/// Build the reporter for a format tag.
pub fn reporter_for(format: ReportFormat) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Console => Box::new(ConsoleReporter),
        ReportFormat::Json => Box::new(JsonReporter),
        ReportFormat::Junit => Box::new(JunitReporter),
    }
}

/// Per-run tallies shared by the summary renderers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub todo: usize,
}

impl Tally {
    pub(crate) fn of(results: &[TestResult]) -> Self {
        let mut tally = Tally::default();
        for result in results {
            if result.failure_count() > 0 {
                tally.failed += 1;
            } else if result.is_todo() {
                tally.todo += 1;
            } else {
                tally.passed += 1;
            }
        }
        tally
    }
}
