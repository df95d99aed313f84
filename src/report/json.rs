//! Machine-readable event reporter.
//!
//! Emits one event object per payload: `runStart`, `testCompleted` and `runComplete`.

use std::time::Duration;

use serde_json::{Value, json};

use conductor_core::outcome::whole_millis;
use conductor_core::{Outcome, RunInfo, TestResult};

use super::{ReportFormat, Reporter, Tally};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }

    fn report_begin(&self, run: &RunInfo) -> Option<Value> {
        Some(json!({
            "event": "runStart",
            "testCount": run.test_count,
            "fuzzRuns": run.fuzz_runs,
            "paths": run.paths,
            "initialSeed": run.initial_seed,
        }))
    }

    fn report_complete(&self, result: &TestResult) -> Option<Value> {
        let failures: Vec<Value> = result
            .outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Fail { message, given } => Some(json!({ "message": message, "given": given })),
                _ => None,
            })
            .collect();

        Some(json!({
            "event": "testCompleted",
            "status": status(result),
            "labels": result.labels,
            "failures": failures,
            "duration": whole_millis(result.duration),
        }))
    }

    fn report_summary(&self, duration: Duration, auto_fail: Option<&str>, results: &[TestResult]) -> Value {
        let tally = Tally::of(results);
        json!({
            "event": "runComplete",
            "passed": tally.passed,
            "failed": tally.failed,
            "todo": tally.todo,
            "duration": whole_millis(duration),
            "autoFail": auto_fail,
        })
    }
}

fn status(result: &TestResult) -> &'static str {
    if result.failure_count() > 0 {
        "fail"
    } else if result.is_todo() {
        "todo"
    } else {
        "pass"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_start_event() {
        let run = RunInfo {
            test_count: 2,
            paths: vec!["a".into(), "b".into()],
            fuzz_runs: 50,
            initial_seed: 9,
        };
        assert_eq!(
            JsonReporter.report_begin(&run).unwrap(),
            json!({
                "event": "runStart",
                "testCount": 2,
                "fuzzRuns": 50,
                "paths": ["a", "b"],
                "initialSeed": 9
            })
        );
    }

    #[test]
    fn test_completed_event_lists_failures() {
        let result = TestResult::new(
            vec!["suite".into(), "case".into()],
            vec![Outcome::Pass, Outcome::fail_given("too big", "1000")],
            Duration::from_millis(8),
        );
        assert_eq!(
            JsonReporter.report_complete(&result).unwrap(),
            json!({
                "event": "testCompleted",
                "status": "fail",
                "labels": ["suite", "case"],
                "failures": [{"message": "too big", "given": "1000"}],
                "duration": 8
            })
        );
    }

    #[test]
    fn run_complete_event_carries_autofail() {
        let results = vec![TestResult::new(vec!["t".into()], vec![Outcome::Todo], Duration::ZERO)];
        let summary = JsonReporter.report_summary(Duration::from_millis(40), Some("skip directive used"), &results);
        assert_eq!(
            summary,
            json!({
                "event": "runComplete",
                "passed": 0,
                "failed": 0,
                "todo": 1,
                "duration": 40,
                "autoFail": "skip directive used"
            })
        );
    }
}
