//! Plain-text reporter.
//!
//! Payloads are JSON strings the host prints verbatim. Passing tests produce no per-test output; failures are
//! printed as they complete and todos are listed in the summary.

use std::fmt::Write as _;
use std::time::Duration;

use serde_json::Value;

use conductor_core::outcome::whole_millis;
use conductor_core::{Outcome, RunInfo, TestResult, Verdict, failed_count};

use super::{ReportFormat, Reporter, Tally};
use crate::version::CONDUCTOR_VERSION;

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Console
    }

    fn report_begin(&self, run: &RunInfo) -> Option<Value> {
        Some(Value::String(begin_text(run)))
    }

    fn report_complete(&self, result: &TestResult) -> Option<Value> {
        if result.failure_count() == 0 {
            return None;
        }
        Some(Value::String(failure_text(result)))
    }

    fn report_summary(&self, duration: Duration, auto_fail: Option<&str>, results: &[TestResult]) -> Value {
        Value::String(summary_text(duration, auto_fail, results))
    }
}

fn begin_text(run: &RunInfo) -> String {
    let banner = format!("conductor {CONDUCTOR_VERSION}");
    let noun = if run.test_count == 1 { "test" } else { "tests" };
    let mut text = format!("{banner}\n{}\n\n", "-".repeat(banner.len()));
    let _ = write!(
        text,
        "Running {} {noun}. To reproduce these results, run: conductor run --fuzz {} --seed {}",
        run.test_count, run.fuzz_runs, run.initial_seed
    );
    for path in &run.paths {
        text.push(' ');
        text.push_str(path);
    }
    text.push_str(" -- <test binary>\n");
    text
}

fn failure_text(result: &TestResult) -> String {
    let mut text = String::new();
    if let Some((last, parents)) = result.labels.split_last() {
        for label in parents {
            let _ = writeln!(text, "↓ {label}");
        }
        let _ = writeln!(text, "✗ {last}");
    }

    for outcome in &result.outcomes {
        if let Outcome::Fail { message, given } = outcome {
            text.push('\n');
            if let Some(given) = given {
                let _ = writeln!(text, "    Given {given}\n");
            }
            for line in message.lines() {
                if line.is_empty() {
                    text.push('\n');
                } else {
                    let _ = writeln!(text, "    {line}");
                }
            }
        }
    }
    text
}

fn summary_text(duration: Duration, auto_fail: Option<&str>, results: &[TestResult]) -> String {
    let verdict = Verdict::from_counts(failed_count(results), auto_fail);
    let tally = Tally::of(results);

    let mut text = format!("TEST RUN {}", verdict.as_str());
    if let (Verdict::Incomplete, Some(reason)) = (verdict, auto_fail) {
        let _ = write!(text, " because {reason}");
    }
    text.push_str("\n\n");

    let _ = writeln!(text, "Duration: {} ms", whole_millis(duration));
    let _ = writeln!(text, "Passed:   {}", tally.passed);
    let _ = writeln!(text, "Failed:   {}", tally.failed);
    if tally.todo > 0 {
        let _ = writeln!(text, "Todo:     {}", tally.todo);
        text.push('\n');
        for result in results.iter().filter(|r| r.is_todo()) {
            let _ = writeln!(text, "◦ TODO: {}", result.display_name());
        }
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn result(labels: &[&str], outcomes: Vec<Outcome>) -> TestResult {
        TestResult::new(
            labels.iter().map(|l| l.to_string()).collect(),
            outcomes,
            Duration::from_millis(1),
        )
    }

    fn text(value: Value) -> String {
        value.as_str().unwrap().to_string()
    }

    #[test]
    fn begin_mentions_count_seed_and_paths() {
        let run = RunInfo {
            test_count: 3,
            paths: vec!["tests/math.rs".into()],
            fuzz_runs: 100,
            initial_seed: 42,
        };
        let begin = text(ConsoleReporter.report_begin(&run).unwrap());
        assert!(begin.starts_with(&format!("conductor {CONDUCTOR_VERSION}\n")));
        assert!(begin.contains(
            "Running 3 tests. To reproduce these results, run: conductor run --fuzz 100 --seed 42 tests/math.rs -- <test binary>\n"
        ));
    }

    #[test]
    fn passing_test_has_no_payload() {
        assert!(ConsoleReporter.report_complete(&result(&["ok"], vec![Outcome::Pass])).is_none());
    }

    #[test]
    fn todo_test_has_no_payload() {
        assert!(ConsoleReporter.report_complete(&result(&["later"], vec![Outcome::Todo])).is_none());
    }

    #[test]
    fn failure_lists_label_path_and_message() {
        let failed = result(
            &["math", "division"],
            vec![Outcome::fail_given("expected 2, got 3", "(6, 2)")],
        );
        let body = text(ConsoleReporter.report_complete(&failed).unwrap());
        assert_eq!(
            body,
            "↓ math\n✗ division\n\n    Given (6, 2)\n\n    expected 2, got 3\n"
        );
    }

    #[test]
    fn summary_for_passed_run() {
        let results = vec![result(&["a"], vec![Outcome::Pass]), result(&["b"], vec![Outcome::Pass])];
        let summary = text(ConsoleReporter.report_summary(Duration::from_millis(12), None, &results));
        insta::assert_snapshot!(summary, @r"
        TEST RUN PASSED

        Duration: 12 ms
        Passed:   2
        Failed:   0
        ");
    }

    #[test]
    fn summary_for_incomplete_run_names_reason_and_todos() {
        let results = vec![
            result(&["a"], vec![Outcome::Pass]),
            result(&["parser", "handles unicode"], vec![Outcome::Todo]),
        ];
        let summary = text(ConsoleReporter.report_summary(
            Duration::from_millis(5),
            Some("skip directive used"),
            &results,
        ));
        insta::assert_snapshot!(summary, @r"
        TEST RUN INCOMPLETE because skip directive used

        Duration: 5 ms
        Passed:   1
        Failed:   0
        Todo:     1

        ◦ TODO: parser > handles unicode
        ");
    }

    #[test]
    fn summary_failed_even_with_autofail() {
        let results = vec![result(&["a"], vec![Outcome::fail("x")])];
        let summary = text(ConsoleReporter.report_summary(
            Duration::ZERO,
            Some("exclusive focus directive used"),
            &results,
        ));
        assert!(summary.starts_with("TEST RUN FAILED\n"));
        assert!(summary.contains("Failed:   1"));
    }
}
