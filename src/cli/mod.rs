//! CLI module for conductor
//!
//! This module provides both command-line entry points.
//!
//! ## Entry points
//!
//! - `conductor run [PATHS..] -- <PROGRAM> [ARGS..]` - host a test binary: spawn it, drive it over its
//!   stdin/stdout and exit with the run's exit code
//! - [`run_suite`] - called from a test binary's `main`; serves a [`Suite`] over stdio
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` and `run_suite()` functions handle errors and exit.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_FUZZ_RUNS, RunOptions};
use crate::report::ReportFormat;
use crate::runner::Suite;
use crate::version::CONDUCTOR_VERSION;

/// Environment variables the host uses to pass run options to the runner.
pub const SEED_ENV: &str = "CONDUCTOR_SEED";
pub const FUZZ_ENV: &str = "CONDUCTOR_FUZZ";
pub const REPORT_ENV: &str = "CONDUCTOR_REPORT";
pub const PATHS_ENV: &str = "CONDUCTOR_PATHS";

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Host-driven test orchestrator
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(version = CONDUCTOR_VERSION)]
#[command(about = "Host-driven test orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a test binary and report its results
    Run {
        /// Seed for generated inputs (default: derived from the clock)
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
        /// Fuzz iterations per fuzzed test
        #[arg(long, value_name = "N", default_value_t = DEFAULT_FUZZ_RUNS, value_parser = clap::value_parser!(u32).range(1..))]
        fuzz: u32,
        /// Report format: console, json or junit
        #[arg(long, value_name = "FORMAT", default_value = "console", value_parser = parse_report)]
        report: ReportFormat,
        /// Source paths under test (echoed by reporters)
        #[arg(value_name = "PATH")]
        paths: Vec<String>,
        /// Test binary to run, with its arguments
        #[arg(last = true, required = true, value_name = "PROGRAM")]
        program: Vec<String>,
    },
}

/// Options a test binary accepts from its host.
///
/// Every option falls back to its `CONDUCTOR_*` environment variable; values stay raw strings so a malformed
/// value turns into an invalid run instead of a parse abort.
#[derive(Parser, Debug, Default)]
#[command(name = "conductor-runner")]
#[command(version = CONDUCTOR_VERSION)]
#[command(about = "Serve this test binary's suite over stdin/stdout", long_about = None)]
pub struct RunnerArgs {
    /// Seed for generated inputs
    #[arg(long, env = SEED_ENV, value_name = "SEED")]
    pub seed: Option<String>,
    /// Fuzz iterations per fuzzed test
    #[arg(long, env = FUZZ_ENV, value_name = "N")]
    pub fuzz: Option<String>,
    /// Report format: console, json or junit
    #[arg(long, env = REPORT_ENV, value_name = "FORMAT")]
    pub report: Option<String>,
    /// Source paths under test
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

impl RunnerArgs {
    /// Convert to raw run options, reading `CONDUCTOR_PATHS` when no paths were given.
    pub fn into_options(self) -> RunOptions {
        let paths = if self.paths.is_empty() {
            env::var_os(PATHS_ENV)
                .map(|joined| {
                    env::split_paths(&joined)
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(|p: PathBuf| p.to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default()
        } else {
            self.paths
        };

        RunOptions {
            seed: self.seed,
            fuzz: self.fuzz,
            report: self.report,
            paths,
        }
    }
}

fn parse_report(label: &str) -> Result<ReportFormat, String> {
    ReportFormat::parse(label).ok_or_else(|| format!("unknown report format '{label}' (expected console, json or junit)"))
}

// ============================================================================
// CLI entry points
// ============================================================================

/// Install the tracing subscriber.
///
/// Logs go to stderr: stdout is reserved for protocol frames and report payloads.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main CLI entry point for the `conductor` binary.
///
/// This is the only place where `process::exit` is called for the host. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    exit_with(execute(cli));
}

/// Entry point for test binaries: serve `suite` over stdin/stdout until the host closes the channel.
pub fn run_suite(suite: Suite) {
    init_tracing();

    let args = match RunnerArgs::try_parse() {
        Ok(args) => Ok(args),
        Err(err) if !err.use_stderr() => err.exit(), // --help / --version
        Err(err) => Err(err.to_string()),
    };

    exit_with(commands::serve_suite(args, suite));
}

fn exit_with(result: CliResult<ExitCode>) {
    match result {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run {
            seed,
            fuzz,
            report,
            paths,
            program,
        } => commands::host_program(commands::HostRequest {
            seed,
            fuzz,
            report,
            paths,
            program,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
