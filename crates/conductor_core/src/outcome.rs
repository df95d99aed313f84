//! Define the outcome model: single assertion outcomes, per-test results and per-run metadata.
//!
//! ## Wire shape
//!
//! These types serialize to the exact objects carried inside control-protocol messages:
//!
//! - `Outcome`: `{"type":"PASS"}`, `{"type":"TODO"}` or `{"type":"FAIL","message":"..","given":".."|null}`
//! - `TestResult`: `{"labels":[..],"outcomes":[..],"duration":<ms>}`
//!
//! Durations travel as whole milliseconds; sub-millisecond precision is dropped when a result is built.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Represent the result of one assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    Fail {
        message: String,
        /// The generated input that produced the failure, for fuzzed tests.
        #[serde(default)]
        given: Option<String>,
    },
    /// Intentionally incomplete test.
    Todo,
}

impl Outcome {
    /// Create a `Fail` outcome with no generated input attached.
    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Fail {
            message: message.into(),
            given: None,
        }
    }

    /// Create a `Fail` outcome for a fuzzed input.
    pub fn fail_given(message: impl Into<String>, given: impl Into<String>) -> Self {
        Outcome::Fail {
            message: message.into(),
            given: Some(given.into()),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail { .. })
    }

    pub fn is_todo(&self) -> bool {
        matches!(self, Outcome::Todo)
    }
}

/// Represent the aggregated result of one executed test.
///
/// Built exactly once per completed test and never mutated afterwards.
///
/// Build results with [`TestResult::new`]. The fields are public for reading; a struct literal keeps whatever
/// precision its `duration` has, and the wire form drops everything below a millisecond, so such a value only
/// round-trips unchanged when its duration is already whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Label path, outermost `describe` first.
    pub labels: Vec<String>,
    pub outcomes: Vec<Outcome>,
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl TestResult {
    /// Build a result, truncating `duration` to whole milliseconds.
    ///
    /// ## Parameters
    /// - `labels`: the test's label path.
    /// - `outcomes`: the outcomes produced by the test body, in order.
    /// - `duration`: wall-clock time between the start and end timestamps.
    pub fn new(labels: Vec<String>, outcomes: Vec<Outcome>, duration: Duration) -> Self {
        Self {
            labels,
            outcomes,
            duration: truncate_to_millis(duration),
        }
    }

    /// Number of `Fail` outcomes in this result.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fail()).count()
    }

    /// A test passes when it produced no failures and is not marked todo.
    pub fn is_pass(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_pass)
    }

    pub fn is_todo(&self) -> bool {
        self.failure_count() == 0 && self.outcomes.iter().any(Outcome::is_todo)
    }

    /// Labels joined with ` > ` for single-line display.
    pub fn display_name(&self) -> String {
        self.labels.join(" > ")
    }
}

/// Represent immutable per-run metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub test_count: usize,
    /// Source paths under test, as given to the runner.
    pub paths: Vec<String>,
    pub fuzz_runs: u32,
    pub initial_seed: u64,
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Drop the sub-millisecond part of `duration`.
pub fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(whole_millis(duration))
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(super::whole_millis(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fail_outcome_encodes_null_given() {
        let value = serde_json::to_value(Outcome::fail("expected 1, got 2")).unwrap();
        assert_eq!(
            value,
            json!({"type": "FAIL", "message": "expected 1, got 2", "given": null})
        );
    }

    #[test]
    fn unit_outcomes_encode_type_only() {
        assert_eq!(serde_json::to_value(Outcome::Pass).unwrap(), json!({"type": "PASS"}));
        assert_eq!(serde_json::to_value(Outcome::Todo).unwrap(), json!({"type": "TODO"}));
    }

    #[test]
    fn fail_outcome_decodes_without_given() {
        let outcome: Outcome = serde_json::from_value(json!({"type": "FAIL", "message": "nope"})).unwrap();
        assert_eq!(outcome, Outcome::fail("nope"));
    }

    #[test]
    fn result_truncates_sub_millisecond_duration() {
        let result = TestResult::new(vec!["a".into()], vec![Outcome::Pass], Duration::from_micros(2_750));
        assert_eq!(result.duration, Duration::from_millis(2));
    }

    #[test]
    fn result_encodes_duration_as_millis() {
        let result = TestResult::new(
            vec!["math".into(), "adds".into()],
            vec![Outcome::Pass],
            Duration::from_millis(14),
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"labels": ["math", "adds"], "outcomes": [{"type": "PASS"}], "duration": 14})
        );
    }

    #[test]
    fn literal_result_loses_sub_millisecond_precision_on_the_wire() {
        let literal = TestResult {
            labels: vec!["slow".into()],
            outcomes: vec![Outcome::Pass],
            duration: Duration::from_micros(2_750),
        };
        let decoded: TestResult = serde_json::from_value(serde_json::to_value(&literal).unwrap()).unwrap();
        assert_ne!(decoded, literal);
        assert_eq!(decoded, TestResult::new(literal.labels.clone(), literal.outcomes.clone(), literal.duration));
    }

    #[test]
    fn whole_millis_saturates() {
        assert_eq!(whole_millis(Duration::from_micros(1_999)), 1);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
        assert_eq!(truncate_to_millis(Duration::from_micros(1_999)), Duration::from_millis(1));
    }

    #[test]
    fn result_classification() {
        let todo = TestResult::new(vec![], vec![Outcome::Pass, Outcome::Todo], Duration::ZERO);
        assert!(todo.is_todo());
        assert!(!todo.is_pass());

        let failed = TestResult::new(vec![], vec![Outcome::Todo, Outcome::fail("x")], Duration::ZERO);
        assert!(!failed.is_todo());
        assert_eq!(failed.failure_count(), 1);
    }
}
