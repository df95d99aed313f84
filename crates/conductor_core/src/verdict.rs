//! Compute the final run verdict.
//!
//! The verdict is a pure function of the number of failed assertions and the run's autofail reason. It is the
//! single source of truth for the `exitCode` carried by the `SUMMARY` message.
//!
//! ## Notes
//! - Failures dominate: a run with failures is `Failed` even when it also carries an autofail reason.

use crate::outcome::TestResult;

/// Represent the aggregate outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every executed assertion passed and no autofail condition is set.
    Passed,
    /// At least one assertion failed.
    Failed,
    /// No assertion failed, but the run was auto-failed (focus/skip used, or invalid configuration).
    Incomplete,
}

impl Verdict {
    /// Derive the verdict from a failure count and an optional autofail reason.
    ///
    /// ## Parameters
    /// - `failed_count`: number of `Fail` outcomes across all results.
    /// - `auto_fail`: the run's autofail reason, if any.
    ///
    /// ## Returns
    /// - (`Verdict`): `Failed` when `failed_count > 0`, else `Incomplete` when `auto_fail` is set, else `Passed`.
    pub fn from_counts(failed_count: usize, auto_fail: Option<&str>) -> Self {
        if failed_count > 0 {
            Verdict::Failed
        } else if auto_fail.is_some() {
            Verdict::Incomplete
        } else {
            Verdict::Passed
        }
    }

    /// Process exit status for this verdict.
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Passed => 0,
            Verdict::Failed => 2,
            Verdict::Incomplete => 3,
        }
    }

    /// Inverse of [`Verdict::exit_code`], for hosts decoding a `SUMMARY` message.
    pub fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Verdict::Passed),
            2 => Some(Verdict::Failed),
            3 => Some(Verdict::Incomplete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Passed => "PASSED",
            Verdict::Failed => "FAILED",
            Verdict::Incomplete => "INCOMPLETE",
        }
    }
}

/// Compute the exit code for a run.
pub fn exit_code(failed_count: usize, auto_fail: Option<&str>) -> i32 {
    Verdict::from_counts(failed_count, auto_fail).exit_code()
}

/// Count `Fail` outcomes across all results.
pub fn failed_count(results: &[TestResult]) -> usize {
    results.iter().map(TestResult::failure_count).sum()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::outcome::Outcome;

    #[test]
    fn clean_run_exits_zero() {
        assert_eq!(exit_code(0, None), 0);
    }

    #[test]
    fn failures_exit_two() {
        assert_eq!(exit_code(3, None), 2);
    }

    #[test]
    fn autofail_without_failures_exits_three() {
        assert_eq!(exit_code(0, Some("skip directive used")), 3);
    }

    #[test]
    fn failures_dominate_autofail() {
        assert_eq!(exit_code(5, Some("exclusive focus directive used")), 2);
    }

    #[test]
    fn exit_code_round_trips_through_verdict() {
        for verdict in [Verdict::Passed, Verdict::Failed, Verdict::Incomplete] {
            assert_eq!(Verdict::from_exit_code(verdict.exit_code()), Some(verdict));
        }
        assert_eq!(Verdict::from_exit_code(1), None);
    }

    #[test]
    fn failed_count_counts_outcomes_not_tests() {
        let results = vec![
            TestResult::new(
                vec!["a".into()],
                vec![Outcome::fail("x"), Outcome::fail("y")],
                Duration::ZERO,
            ),
            TestResult::new(vec!["b".into()], vec![Outcome::Pass, Outcome::Todo], Duration::ZERO),
            TestResult::new(vec!["c".into()], vec![Outcome::fail("z")], Duration::ZERO),
        ];
        assert_eq!(failed_count(&results), 3);
    }
}
