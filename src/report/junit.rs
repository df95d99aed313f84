//! JUnit XML reporter.
//!
//! JUnit consumers expect a single document, so this reporter opts out of the begin and per-test payloads and
//! renders everything in the summary.

use std::fmt::Write as _;
use std::time::Duration;

use serde_json::Value;

use conductor_core::{Outcome, RunInfo, TestResult};

use super::{ReportFormat, Reporter, Tally};

#[derive(Debug, Default, Clone, Copy)]
pub struct JunitReporter;

impl Reporter for JunitReporter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Junit
    }

    fn report_begin(&self, _run: &RunInfo) -> Option<Value> {
        None
    }

    fn report_complete(&self, _result: &TestResult) -> Option<Value> {
        None
    }

    fn report_summary(&self, duration: Duration, auto_fail: Option<&str>, results: &[TestResult]) -> Value {
        Value::String(render_suite(duration, auto_fail, results))
    }
}

fn render_suite(duration: Duration, auto_fail: Option<&str>, results: &[TestResult]) -> String {
    let tally = Tally::of(results);
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        xml,
        "<testsuite name=\"conductor\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"{}\" time=\"{}\">",
        results.len(),
        tally.failed,
        tally.todo,
        seconds(duration)
    );

    if let Some(reason) = auto_fail {
        xml.push_str("  <properties>\n");
        let _ = writeln!(xml, "    <property name=\"autoFail\" value=\"{}\"/>", escape(reason));
        xml.push_str("  </properties>\n");
    }

    for result in results {
        let (classname, name) = match result.labels.split_last() {
            Some((last, parents)) => (parents.join(" "), last.as_str()),
            None => (String::new(), ""),
        };
        let open = format!(
            "  <testcase classname=\"{}\" name=\"{}\" time=\"{}\"",
            escape(&classname),
            escape(name),
            seconds(result.duration)
        );

        let failures: Vec<&Outcome> = result.outcomes.iter().filter(|o| o.is_fail()).collect();
        if !failures.is_empty() {
            let _ = writeln!(xml, "{open}>");
            for failure in failures {
                if let Outcome::Fail { message, given } = failure {
                    let body = match given {
                        Some(given) => format!("Given {given}\n\n{message}"),
                        None => message.clone(),
                    };
                    let _ = writeln!(
                        xml,
                        "    <failure message=\"{}\">{}</failure>",
                        escape(first_line(message)),
                        escape(&body)
                    );
                }
            }
            xml.push_str("  </testcase>\n");
        } else if result.is_todo() {
            let _ = writeln!(xml, "{open}>");
            xml.push_str("    <skipped message=\"todo\"/>\n");
            xml.push_str("  </testcase>\n");
        } else {
            let _ = writeln!(xml, "{open}/>");
        }
    }

    xml.push_str("</testsuite>\n");
    xml
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Escape text for use in XML attributes and character data.
///
/// Characters XML 1.0 cannot carry at all (C0 controls other than tab, LF and CR, plus U+FFFE and U+FFFF)
/// become U+FFFD.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => out.push(char::REPLACEMENT_CHARACTER),
            _ => out.push(ch),
        }
    }
    out
}
