//! Runner side of the control protocol.
//!
//! The [`Orchestrator`] owns the registry of pending tests and answers one control message at a time. It never
//! dispatches on its own initiative: the host decides which test runs next by sending `TEST` messages.
//!
//! ## Phases
//!
//! - `Ready`: tests registered, nothing dispatched yet.
//! - `Running`: at least one test dispatched.
//! - `Done`: summary sent. Further messages are answered with `ERROR` and change nothing.
//!
//! ## Fault containment
//!
//! A test body runs on tokio's blocking pool inside `catch_unwind`. A panic becomes a single `Fail` outcome for
//! that test; the run continues.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod registry;
pub mod source;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde_json::Value;

use conductor_core::messages::panic_fail_message;
use conductor_core::outcome::{truncate_to_millis, whole_millis};
use conductor_core::{Outcome, RunInfo, TestResult, exit_code, failed_count};

use crate::config::RunConfig;
use crate::protocol::{Inbound, Outbound, decode_inbound, encode_outbound};
use crate::report::{Reporter, reporter_for};
use crate::transport::{Transport, TransportError};

pub use registry::{Registry, TestEntry, TestId, Thunk};
pub use source::{RunnerSource, Suite};

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Running,
    Done,
}

/// Per-run state machine.
pub struct Orchestrator {
    registry: Registry,
    run_info: RunInfo,
    reporter: Box<dyn Reporter>,
    auto_fail: Option<String>,
    start_time: Instant,
    phase: Phase,
}

impl Orchestrator {
    /// Register the tests from `source` and pick the reporter named by `config`.
    ///
    /// Nothing is emitted at init; the host sends `BEGIN` to get the begin-report.
    pub fn init(config: &RunConfig, source: RunnerSource) -> Self {
        Self::with_reporter(config, source, reporter_for(config.report))
    }

    /// Like [`Orchestrator::init`], with an explicit reporter.
    pub fn with_reporter(config: &RunConfig, source: RunnerSource, reporter: Box<dyn Reporter>) -> Self {
        let (entries, auto_fail) = source.into_parts();
        let registry = Registry::from_entries(entries);
        let run_info = RunInfo {
            test_count: registry.test_count(),
            paths: config.paths.clone(),
            fuzz_runs: config.fuzz_runs,
            initial_seed: config.initial_seed,
        };

        tracing::info!(
            test_count = run_info.test_count,
            seed = run_info.initial_seed,
            fuzz_runs = run_info.fuzz_runs,
            format = %reporter.format(),
            auto_fail = auto_fail.as_deref(),
            "runner initialized"
        );

        Self {
            registry,
            run_info,
            reporter,
            auto_fail,
            start_time: Instant::now(),
            phase: Phase::Ready,
        }
    }

    pub fn run_info(&self) -> &RunInfo {
        &self.run_info
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn auto_fail(&self) -> Option<&str> {
        self.auto_fail.as_deref()
    }

    /// Tests registered but not yet dispatched.
    pub fn remaining(&self) -> usize {
        self.registry.remaining()
    }

    /// Decode and handle one raw frame. Undecodable frames are answered with `ERROR`.
    pub async fn handle_frame(&mut self, frame: &str) -> Option<Outbound> {
        match decode_inbound(frame) {
            Ok(message) => self.handle(message).await,
            Err(err) => {
                tracing::warn!(error = %err, "undecodable control message");
                Some(Outbound::error(err))
            }
        }
    }

    /// Handle one control message to completion.
    pub async fn handle(&mut self, message: Inbound) -> Option<Outbound> {
        if self.phase == Phase::Done {
            tracing::warn!(?message, "control message after summary");
            return Some(Outbound::error("run already finished: summary was sent"));
        }

        match message {
            Inbound::Begin => self.begin(),
            Inbound::Test { index } => self.dispatch(index).await,
            Inbound::Summary { results } => Some(self.summarize(&results)),
        }
    }

    fn begin(&self) -> Option<Outbound> {
        let message = self.reporter.report_begin(&self.run_info)?;
        Some(Outbound::Begin {
            format: self.reporter.format(),
            test_count: self.run_info.test_count,
            message,
        })
    }

    async fn dispatch(&mut self, index: TestId) -> Option<Outbound> {
        if index >= self.run_info.test_count {
            tracing::debug!(index, "index past last test; run finished");
            return Some(Outbound::Finished);
        }

        let Some(entry) = self.registry.take(index) else {
            tracing::warn!(index, "test already dispatched; ignoring request");
            return None;
        };
        self.phase = Phase::Running;

        let (labels, thunk) = entry.into_parts();
        let started = Instant::now();
        let outcomes = execute(thunk).await;
        let duration = started.elapsed();

        let summary = TestResult::new(labels, outcomes, duration);
        tracing::debug!(
            index,
            test = %summary.display_name(),
            failures = summary.failure_count(),
            duration_ms = whole_millis(summary.duration),
            "test completed"
        );

        let message = self.reporter.report_complete(&summary).unwrap_or(Value::Null);
        Some(Outbound::TestCompleted {
            index,
            summary,
            format: self.reporter.format(),
            message,
        })
    }

    fn summarize(&mut self, results: &[TestResult]) -> Outbound {
        let duration = Instant::now().saturating_duration_since(self.start_time);
        let failed = failed_count(results);
        let code = exit_code(failed, self.auto_fail.as_deref());
        let message = self
            .reporter
            .report_summary(truncate_to_millis(duration), self.auto_fail.as_deref(), results);

        self.phase = Phase::Done;
        tracing::info!(
            results = results.len(),
            failed,
            exit_code = code,
            duration_ms = whole_millis(duration),
            "run summarized"
        );

        Outbound::Summary {
            exit_code: code,
            format: self.reporter.format(),
            message,
        }
    }
}

/// Run a test body off the async runtime, containing panics.
async fn execute(thunk: Thunk) -> Vec<Outcome> {
    match tokio::task::spawn_blocking(move || run_contained(thunk)).await {
        Ok(outcomes) => outcomes,
        Err(err) => vec![Outcome::fail(format!("test task did not complete: {err}"))],
    }
}

/// Invoke a test body, turning a panic into a single `Fail` outcome.
pub fn run_contained(thunk: Thunk) -> Vec<Outcome> {
    match panic::catch_unwind(AssertUnwindSafe(thunk)) {
        Ok(outcomes) => outcomes,
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            tracing::debug!(detail, "test body panicked");
            vec![Outcome::fail(panic_fail_message(detail))]
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

/// Serve control messages from `transport` until the host closes it.
///
/// Each frame is handled to completion and its reply sent before the next frame is read.
///
/// ## Returns
/// - the phase the run ended in; anything but `Done` means the host stopped early.
pub async fn serve<T: Transport>(mut orchestrator: Orchestrator, mut transport: T) -> Result<Phase, TransportError> {
    while let Some(frame) = transport.recv().await? {
        let Some(reply) = orchestrator.handle_frame(&frame).await else {
            continue;
        };
        let encoded = encode_outbound(&reply).unwrap_or_else(|err| {
            tracing::error!(error = %err, kind = reply.kind(), "failed to encode reply");
            serde_json::json!({ "type": "ERROR", "message": err.to_string() }).to_string()
        });
        transport.send(encoded).await?;
    }

    let phase = orchestrator.phase();
    if phase != Phase::Done {
        tracing::warn!(remaining = orchestrator.remaining(), "host closed the channel before the summary");
    }
    Ok(phase)
}
