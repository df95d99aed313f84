//! Host side of the control protocol.
//!
//! [`drive`] runs the standard sequence against a runner: `BEGIN`, then `TEST 0`, `TEST 1`, ... until the
//! runner answers `FINISHED`, then `SUMMARY` with every result it collected. Reporter payloads are handed to a
//! [`HostOutput`] as they arrive.
//!
//! Indices are always requested in order and only after the previous test completed, so the premature
//! `FINISHED` a host could provoke by skipping ahead never happens here.

use std::io::Write;

use serde_json::Value;
use thiserror::Error;

use conductor_core::{TestResult, Verdict};

use crate::protocol::{Inbound, Outbound, ProtocolError, decode_outbound, encode_inbound};
use crate::report::ReportFormat;
use crate::transport::{Transport, TransportError};

/// Errors that end a hosted run without a verdict.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed message from runner: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("runner reported an error: {0}")]
    Runner(String),

    #[error("runner closed the channel before {0}")]
    Disconnected(&'static str),

    #[error("unexpected {got} message while waiting for {expected}")]
    Unexpected { expected: &'static str, got: &'static str },

    #[error("runner completed test {got} but test {expected} was requested")]
    OutOfOrder { expected: usize, got: usize },

    #[error("runner sent unknown exit code {0}")]
    UnknownExitCode(i32),
}

/// Sink for reporter payloads received by the host.
pub trait HostOutput {
    fn emit(&mut self, format: ReportFormat, payload: &Value);
}

/// Print payloads to a writer: strings verbatim, anything else as one line of JSON.
pub struct WriterOutput<W> {
    writer: W,
}

impl<W: Write> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterOutput<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> HostOutput for WriterOutput<W> {
    fn emit(&mut self, _format: ReportFormat, payload: &Value) {
        let written = match payload {
            Value::Null => Ok(()),
            Value::String(text) if text.ends_with('\n') => write!(self.writer, "{text}"),
            Value::String(text) => writeln!(self.writer, "{text}"),
            other => writeln!(self.writer, "{other}"),
        };
        if let Err(err) = written.and_then(|_| self.writer.flush()) {
            tracing::warn!(error = %err, "failed to write report payload");
        }
    }
}

/// Keep payloads in memory.
#[derive(Debug, Default)]
pub struct CollectingOutput {
    pub payloads: Vec<(ReportFormat, Value)>,
}

impl HostOutput for CollectingOutput {
    fn emit(&mut self, format: ReportFormat, payload: &Value) {
        self.payloads.push((format, payload.clone()));
    }
}

/// What a completed hosted run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HostReport {
    pub verdict: Verdict,
    pub exit_code: i32,
    /// Results in dispatch order.
    pub results: Vec<TestResult>,
}

/// Drive a runner through a complete run.
pub async fn drive<T, O>(transport: &mut T, output: &mut O) -> Result<HostReport, HostError>
where
    T: Transport,
    O: HostOutput,
{
    send(transport, &Inbound::Begin).await?;
    let mut next = 0usize;
    send(transport, &Inbound::Test { index: next }).await?;

    let mut results = Vec::new();
    loop {
        match recv(transport, "FINISHED").await? {
            Outbound::Begin { format, message, .. } => output.emit(format, &message),
            Outbound::TestCompleted {
                index,
                summary,
                format,
                message,
            } => {
                if index != next {
                    return Err(HostError::OutOfOrder { expected: next, got: index });
                }
                if !message.is_null() {
                    output.emit(format, &message);
                }
                tracing::debug!(index, test = %summary.display_name(), "test result received");
                results.push(summary);
                next += 1;
                send(transport, &Inbound::Test { index: next }).await?;
            }
            Outbound::Finished => break,
            Outbound::Error { message } => return Err(HostError::Runner(message)),
            other => {
                return Err(HostError::Unexpected {
                    expected: "TEST_COMPLETED or FINISHED",
                    got: other.kind(),
                });
            }
        }
    }

    send(
        transport,
        &Inbound::Summary {
            results: results.clone(),
        },
    )
    .await?;

    match recv(transport, "SUMMARY").await? {
        Outbound::Summary {
            exit_code,
            format,
            message,
        } => {
            output.emit(format, &message);
            let verdict = Verdict::from_exit_code(exit_code).ok_or(HostError::UnknownExitCode(exit_code))?;
            tracing::info!(tests = results.len(), exit_code, "run finished");
            Ok(HostReport {
                verdict,
                exit_code,
                results,
            })
        }
        Outbound::Error { message } => Err(HostError::Runner(message)),
        other => Err(HostError::Unexpected {
            expected: "SUMMARY",
            got: other.kind(),
        }),
    }
}

async fn send<T: Transport>(transport: &mut T, message: &Inbound) -> Result<(), HostError> {
    transport.send(encode_inbound(message)?).await?;
    Ok(())
}

async fn recv<T: Transport>(transport: &mut T, waiting_for: &'static str) -> Result<Outbound, HostError> {
    let frame = transport.recv().await?.ok_or(HostError::Disconnected(waiting_for))?;
    Ok(decode_outbound(&frame)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn writer_output_prints_strings_verbatim_and_objects_as_lines() {
        let mut output = WriterOutput::new(Vec::new());
        output.emit(ReportFormat::Console, &json!("hello\n"));
        output.emit(ReportFormat::Console, &json!("no newline"));
        output.emit(ReportFormat::Json, &json!({"event": "runStart"}));
        output.emit(ReportFormat::Json, &Value::Null);
        let written = String::from_utf8(output.into_inner()).unwrap();
        assert_eq!(written, "hello\nno newline\n{\"event\":\"runStart\"}\n");
    }

    #[test]
    fn collecting_output_keeps_format() {
        let mut output = CollectingOutput::default();
        output.emit(ReportFormat::Junit, &json!("<testsuite/>"));
        assert_eq!(output.payloads, vec![(ReportFormat::Junit, json!("<testsuite/>"))]);
    }
}
