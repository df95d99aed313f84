//! Shared user-facing messages used by the runner, the reporters and the host.
//!
//! Keeping the autofail reasons here means the console summary and the JSON `autoFail` field always print the
//! same text the runner recorded at init.

/// Autofail reason recorded when the suite was narrowed to focused tests.
pub const FOCUS_AUTO_FAIL_MSG: &str = "exclusive focus directive used";

/// Autofail reason recorded when at least one test was skipped.
pub const SKIP_AUTO_FAIL_MSG: &str = "skip directive used";

/// Invalid-run reason when a suite registers nothing.
pub const NO_TESTS_MSG: &str = "no tests were registered";

/// Prefix for the single `Fail` outcome produced when a test body panics.
pub const PANIC_FAIL_PREFIX: &str = "test panicked";

/// Build the failure message for a panicking test body.
///
/// ## Parameters
/// - `detail`: the panic payload rendered as text, if it was a string.
///
/// ## Returns
/// - (`String`): `"test panicked: <detail>"`, or just the prefix when no detail is available.
pub fn panic_fail_message(detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{PANIC_FAIL_PREFIX}: {detail}"),
        None => PANIC_FAIL_PREFIX.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_includes_detail() {
        assert_eq!(panic_fail_message(Some("boom")), "test panicked: boom");
    }

    #[test]
    fn panic_message_without_detail_is_prefix() {
        assert_eq!(panic_fail_message(None), PANIC_FAIL_PREFIX);
    }
}
