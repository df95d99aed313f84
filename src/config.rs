//! Run configuration for the runner process.
//!
//! The host passes run options to the runner as raw strings (CLI flags or `CONDUCTOR_*` environment
//! variables). [`RunConfig::from_options`] validates them; a validation failure does not abort the runner, it
//! turns the run into an invalid run whose reason is reported through the normal protocol (exit code 3).

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::report::ReportFormat;

/// Default number of fuzz iterations per fuzzed test.
pub const DEFAULT_FUZZ_RUNS: u32 = 100;

/// Errors produced while validating run options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid seed '{0}': expected a non-negative integer")]
    InvalidSeed(String),

    #[error("invalid fuzz count '{0}': expected a positive integer")]
    InvalidFuzzRuns(String),

    #[error("unknown report format '{0}': expected one of console, json, junit")]
    UnknownReport(String),
}

/// Raw, unvalidated run options as received from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub seed: Option<String>,
    pub fuzz: Option<String>,
    pub report: Option<String>,
    pub paths: Vec<String>,
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Source paths under test (informational; echoed by reporters)
    pub paths: Vec<String>,
    /// Fuzz iterations per fuzzed test
    pub fuzz_runs: u32,
    /// Seed for generated inputs
    pub initial_seed: u64,
    /// Report format the runner renders payloads in
    pub report: ReportFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            fuzz_runs: DEFAULT_FUZZ_RUNS,
            initial_seed: seed_from_clock(),
            report: ReportFormat::Console,
        }
    }
}

impl RunConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source paths under test
    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    /// Set the fuzz iteration count
    pub fn with_fuzz_runs(mut self, fuzz_runs: u32) -> Self {
        self.fuzz_runs = fuzz_runs;
        self
    }

    /// Set the initial seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.initial_seed = seed;
        self
    }

    /// Set the report format
    pub fn with_report(mut self, report: ReportFormat) -> Self {
        self.report = report;
        self
    }

    /// Validate raw options into a config.
    ///
    /// Missing options fall back to the defaults; present-but-malformed options are errors.
    pub fn from_options(options: &RunOptions) -> Result<Self, ConfigError> {
        let mut config = RunConfig::new().with_paths(options.paths.clone());

        if let Some(raw) = &options.seed {
            let seed = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSeed(raw.clone()))?;
            config = config.with_seed(seed);
        }

        if let Some(raw) = &options.fuzz {
            let runs = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|runs| *runs > 0)
                .ok_or_else(|| ConfigError::InvalidFuzzRuns(raw.clone()))?;
            config = config.with_fuzz_runs(runs);
        }

        if let Some(raw) = &options.report {
            let report = ReportFormat::parse(raw).ok_or_else(|| ConfigError::UnknownReport(raw.clone()))?;
            config = config.with_report(report);
        }

        Ok(config)
    }

    /// Best-effort config for an invalid run: keeps whatever options did parse so the report still renders in
    /// the format the host asked for.
    pub fn lenient(options: &RunOptions) -> Self {
        let report = options
            .report
            .as_deref()
            .and_then(ReportFormat::parse)
            .unwrap_or(ReportFormat::Console);
        let seed = options.seed.as_deref().and_then(|s| s.trim().parse().ok());
        let fuzz = options
            .fuzz
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .filter(|runs: &u32| *runs > 0);

        let mut config = RunConfig::new()
            .with_paths(options.paths.clone())
            .with_report(report);
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }
        if let Some(fuzz) = fuzz {
            config = config.with_fuzz_runs(fuzz);
        }
        config
    }
}

/// Derive a seed from the wall clock.
pub fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
