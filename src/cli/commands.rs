//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level entry points.

use std::env;
use std::process::Stdio;

use tokio::io::BufReader;
use tokio::process::Command;

use crate::config::{RunConfig, seed_from_clock};
use crate::host::{self, WriterOutput};
use crate::report::ReportFormat;
use crate::runner::{Orchestrator, Phase, RunnerSource, Suite, serve};
use crate::transport::LineTransport;

use super::{CliError, CliResult, ExitCode, FUZZ_ENV, PATHS_ENV, REPORT_ENV, RunnerArgs, SEED_ENV};

// ============================================================================
// Runner side
// ============================================================================

/// Serve a suite over stdio.
///
/// `args` is `Err` when the runner's own arguments did not parse; like a malformed option value, that makes the
/// run invalid rather than aborting it, so the host still receives a summary with exit code 3.
pub fn serve_suite(args: Result<RunnerArgs, String>, suite: Suite) -> CliResult<ExitCode> {
    let (config, source) = match args {
        Ok(args) => {
            let options = args.into_options();
            match RunConfig::from_options(&options) {
                Ok(config) => (config, suite.into_source()),
                Err(err) => {
                    tracing::warn!(error = %err, "invalid run configuration");
                    (RunConfig::lenient(&options), RunnerSource::Invalid(err.to_string()))
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "invalid runner arguments");
            (RunConfig::new(), RunnerSource::Invalid(err.trim().to_string()))
        }
    };

    let orchestrator = Orchestrator::init(&config, source);
    let runtime = build_runtime()?;
    match runtime.block_on(serve(orchestrator, LineTransport::stdio())) {
        Ok(Phase::Done) => Ok(ExitCode::SUCCESS),
        Ok(_) => Err(CliError::failure("host closed the channel before requesting a summary")),
        Err(e) => Err(CliError::failure(format!("Error serving tests: {}", e))),
    }
}

// ============================================================================
// Host side
// ============================================================================

/// Options for hosting a test binary.
#[derive(Debug, Clone)]
pub struct HostRequest {
    pub seed: Option<u64>,
    pub fuzz: u32,
    pub report: ReportFormat,
    pub paths: Vec<String>,
    /// Program followed by its arguments
    pub program: Vec<String>,
}

/// Spawn the test binary, drive a full run over its stdin/stdout and return the run's exit code.
pub fn host_program(request: HostRequest) -> CliResult<ExitCode> {
    let runtime = build_runtime()?;
    runtime.block_on(host_program_async(request))
}

async fn host_program_async(request: HostRequest) -> CliResult<ExitCode> {
    let Some((program, program_args)) = request.program.split_first() else {
        return Err(CliError::failure("Error: run requires a test program after `--`"));
    };
    let seed = request.seed.unwrap_or_else(seed_from_clock);

    let mut command = Command::new(program);
    command
        .args(program_args)
        .env(SEED_ENV, seed.to_string())
        .env(FUZZ_ENV, request.fuzz.to_string())
        .env(REPORT_ENV, request.report.as_str())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    if request.paths.is_empty() {
        command.env_remove(PATHS_ENV);
    } else {
        let joined = env::join_paths(&request.paths)
            .map_err(|e| CliError::failure(format!("Error: invalid test path: {}", e)))?;
        command.env(PATHS_ENV, joined);
    }

    tracing::debug!(program = %program, seed, fuzz = request.fuzz, report = %request.report, "spawning test program");
    let mut child = command
        .spawn()
        .map_err(|e| CliError::failure(format!("Error starting '{}': {}", program, e)))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| CliError::failure("Error: test program stdin unavailable"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CliError::failure("Error: test program stdout unavailable"))?;

    let mut transport = LineTransport::new(BufReader::new(stdout), stdin);
    let mut output = WriterOutput::stdout();
    let outcome = host::drive(&mut transport, &mut output).await;

    // Closing stdin ends the runner's serve loop.
    drop(transport);
    match child.wait().await {
        Ok(status) if !status.success() => tracing::warn!(%status, "test program exited unsuccessfully"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "failed to wait for test program"),
    }

    match outcome {
        Ok(report) => Ok(ExitCode(report.exit_code)),
        Err(e) => Err(CliError::failure(format!("Error: {}", e))),
    }
}

fn build_runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting async runtime: {}", e)))
}
