#![forbid(unsafe_code)]
//! Conductor: host-driven test orchestration
//!
//! A test binary registers its tests and hands them to an [`Orchestrator`]. The orchestrator never runs
//! anything on its own: a host drives it over a duplex channel of line-delimited JSON messages, asking for the
//! begin-report, then for each test by index, and finally for the summary and exit code.
//!
//! - runner side: [`runner`] (state machine, registry, suite collection) and [`report`] (reporters)
//! - host side: [`host::drive`] and the `conductor run` command
//! - shared: [`protocol`] (message shapes and codec), [`transport`] (stdio and in-memory channels)
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `runner` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test bodies**: a panicking test body is contained and reported as a failure of that test. It never takes
//!   the runner down.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod host;
pub mod protocol;
pub mod report;
pub mod runner;
pub mod transport;
pub mod version;

pub use conductor_core::{Outcome, RunInfo, TestResult, Verdict};

pub use config::RunConfig;
pub use protocol::{Inbound, Outbound};
pub use report::{ReportFormat, Reporter};
pub use runner::{Orchestrator, RunnerSource, Suite, serve};
