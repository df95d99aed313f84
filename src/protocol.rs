//! Control protocol between the host and the runner.
//!
//! Every message is one JSON object on its own line, discriminated by a `"type"` field.
//!
//! ## Inbound (host → runner)
//!
//! - `{"type":"BEGIN"}`
//! - `{"type":"TEST","index":3}`
//! - `{"type":"SUMMARY","results":[<TestResult>, ...]}`
//!
//! ## Outbound (runner → host)
//!
//! - `{"type":"BEGIN","format":"console","testCount":3,"message":...}`
//! - `{"type":"TEST_COMPLETED","index":0,"summary":<TestResult>,"format":"console","message":...|null}`
//! - `{"type":"FINISHED"}`
//! - `{"type":"SUMMARY","exitCode":0,"format":"console","message":...}`
//! - `{"type":"ERROR","message":"..."}`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use conductor_core::TestResult;

use crate::report::ReportFormat;

/// Errors raised by the frame codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not a well-formed message. Displays the decoder's text verbatim.
    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Control message sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Inbound {
    /// Ask for the begin-report.
    Begin,
    /// Ask the runner to dispatch test `index`.
    Test { index: usize },
    /// Ask for the final summary over the results the host accumulated.
    Summary { results: Vec<TestResult> },
}

/// Report message sent by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Outbound {
    Begin {
        format: ReportFormat,
        test_count: usize,
        message: Value,
    },
    TestCompleted {
        index: usize,
        summary: TestResult,
        format: ReportFormat,
        /// `null` when the reporter has nothing to say about this test.
        message: Value,
    },
    /// No more tests will be dispatched.
    Finished,
    Summary {
        exit_code: i32,
        format: ReportFormat,
        message: Value,
    },
    Error {
        message: String,
    },
}

impl Outbound {
    /// Build an `ERROR` message from any displayable error.
    pub fn error(err: impl std::fmt::Display) -> Self {
        Outbound::Error {
            message: err.to_string(),
        }
    }

    /// Wire discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Begin { .. } => "BEGIN",
            Outbound::TestCompleted { .. } => "TEST_COMPLETED",
            Outbound::Finished => "FINISHED",
            Outbound::Summary { .. } => "SUMMARY",
            Outbound::Error { .. } => "ERROR",
        }
    }
}

/// Decode one inbound frame.
pub fn decode_inbound(frame: &str) -> Result<Inbound, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Decode)
}

/// Encode one inbound frame (host side).
pub fn encode_inbound(message: &Inbound) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Decode one outbound frame (host side).
pub fn decode_outbound(frame: &str) -> Result<Outbound, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Decode)
}

/// Encode one outbound frame.
pub fn encode_outbound(message: &Outbound) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use conductor_core::Outcome;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_begin() {
        assert_eq!(decode_inbound(r#"{"type":"BEGIN"}"#).unwrap(), Inbound::Begin);
    }

    #[test]
    fn decodes_test_index() {
        assert_eq!(
            decode_inbound(r#"{"type":"TEST","index":7}"#).unwrap(),
            Inbound::Test { index: 7 }
        );
    }

    #[test]
    fn decodes_summary_results() {
        let frame = r#"{"type":"SUMMARY","results":[{"labels":["a"],"outcomes":[{"type":"TODO"}],"duration":3}]}"#;
        let Inbound::Summary { results } = decode_inbound(frame).unwrap() else {
            panic!("expected SUMMARY");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcomes, vec![Outcome::Todo]);
        assert_eq!(results[0].duration, Duration::from_millis(3));
    }

    #[test]
    fn rejects_negative_index() {
        assert!(decode_inbound(r#"{"type":"TEST","index":-1}"#).is_err());
    }

    #[test]
    fn rejects_unknown_type() {
        let err = decode_inbound(r#"{"type":"RESTART"}"#).unwrap_err();
        assert!(err.to_string().contains("RESTART"), "unexpected error text: {err}");
    }

    #[test]
    fn decode_error_text_is_verbatim() {
        let raw = serde_json::from_str::<Inbound>("not json").unwrap_err().to_string();
        let err = decode_inbound("not json").unwrap_err();
        assert_eq!(err.to_string(), raw);
    }

    #[test]
    fn encodes_test_completed_shape() {
        let message = Outbound::TestCompleted {
            index: 1,
            summary: TestResult::new(vec!["x".into()], vec![Outcome::Pass], Duration::from_millis(5)),
            format: ReportFormat::Json,
            message: Value::Null,
        };
        let value: Value = serde_json::from_str(&encode_outbound(&message).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "TEST_COMPLETED",
                "index": 1,
                "summary": {"labels": ["x"], "outcomes": [{"type": "PASS"}], "duration": 5},
                "format": "json",
                "message": null
            })
        );
    }

    #[test]
    fn encodes_summary_with_camel_case_exit_code() {
        let message = Outbound::Summary {
            exit_code: 3,
            format: ReportFormat::Console,
            message: json!("done"),
        };
        let value: Value = serde_json::from_str(&encode_outbound(&message).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "SUMMARY", "exitCode": 3, "format": "console", "message": "done"})
        );
    }

    #[test]
    fn encodes_finished_as_bare_type() {
        assert_eq!(encode_outbound(&Outbound::Finished).unwrap(), r#"{"type":"FINISHED"}"#);
    }
}
