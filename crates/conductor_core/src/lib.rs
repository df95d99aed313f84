//! Provide the shared outcome model and verdict rules for the conductor test orchestrator.
//!
//! This crate is intentionally small and dependency-light. It holds the value types that both sides of the
//! control protocol agree on:
//! - the runner (which executes tests and builds results), and
//! - the host (which accumulates results and maps the final verdict to a process exit status).
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no async runtime, no global state.
//! - Serialization shapes live here (via `serde` derives) so the wire format cannot drift between runner and host.

pub mod messages;
pub mod outcome;
pub mod verdict;

pub use outcome::{Outcome, RunInfo, TestResult};
pub use verdict::{Verdict, exit_code, failed_count};
