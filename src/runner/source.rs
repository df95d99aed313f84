//! How the test set handed to the orchestrator was assembled.
//!
//! A [`RunnerSource`] tells the orchestrator both which tests to register and whether the run must be
//! auto-failed. [`Suite`] is a small collector that builds one: it records label paths, focus (`only`) and
//! skip marks, and classifies the result.

use std::collections::HashSet;

use conductor_core::Outcome;
use conductor_core::messages::{FOCUS_AUTO_FAIL_MSG, NO_TESTS_MSG, SKIP_AUTO_FAIL_MSG};

use super::registry::TestEntry;

/// The assembled test set.
#[derive(Debug)]
pub enum RunnerSource {
    /// Every registered test runs.
    Plain(Vec<TestEntry>),
    /// Only focused tests run; the run is auto-failed.
    OnlyFocused(Vec<TestEntry>),
    /// Skipped tests were dropped; the run is auto-failed.
    Skipping(Vec<TestEntry>),
    /// Nothing runs; the reason becomes the autofail reason.
    Invalid(String),
}

impl RunnerSource {
    /// Split into the entries to register and the autofail reason.
    pub fn into_parts(self) -> (Vec<TestEntry>, Option<String>) {
        match self {
            RunnerSource::Plain(entries) => (entries, None),
            RunnerSource::OnlyFocused(entries) => (entries, Some(FOCUS_AUTO_FAIL_MSG.to_string())),
            RunnerSource::Skipping(entries) => (entries, Some(SKIP_AUTO_FAIL_MSG.to_string())),
            RunnerSource::Invalid(reason) => (Vec::new(), Some(reason)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Normal,
    Only,
    Skip,
}

/// Collects test entries under nested `describe` labels.
#[derive(Debug, Default)]
pub struct Suite {
    entries: Vec<(TestEntry, Mark)>,
    prefix: Vec<String>,
    seen: HashSet<Vec<String>>,
    problems: Vec<String>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test.
    pub fn test<F>(&mut self, name: &str, body: F) -> &mut Self
    where
        F: FnOnce() -> Vec<Outcome> + Send + 'static,
    {
        self.push(name, Mark::Normal, body)
    }

    /// Register a focused test. When any test is focused, only focused tests run.
    pub fn only<F>(&mut self, name: &str, body: F) -> &mut Self
    where
        F: FnOnce() -> Vec<Outcome> + Send + 'static,
    {
        self.push(name, Mark::Only, body)
    }

    /// Register a test that will not run.
    pub fn skip<F>(&mut self, name: &str, body: F) -> &mut Self
    where
        F: FnOnce() -> Vec<Outcome> + Send + 'static,
    {
        self.push(name, Mark::Skip, body)
    }

    /// Register a placeholder that reports a single `Todo` outcome.
    pub fn todo(&mut self, name: &str) -> &mut Self {
        self.push(name, Mark::Normal, || vec![Outcome::Todo])
    }

    /// Register the tests added by `build` under the label `name`.
    pub fn describe<B>(&mut self, name: &str, build: B) -> &mut Self
    where
        B: FnOnce(&mut Suite),
    {
        if name.trim().is_empty() {
            self.problems.push(blank_label_problem(&self.prefix));
        }
        self.prefix.push(name.to_string());
        build(self);
        self.prefix.pop();
        self
    }

    /// Number of registered tests, including skipped ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify the collected tests.
    ///
    /// ## Returns
    /// - `Invalid` when nothing was registered or a label is blank or duplicated.
    /// - `OnlyFocused` with the focused tests when any test is focused.
    /// - `Skipping` with the unskipped tests when any test is skipped.
    /// - `Plain` otherwise.
    pub fn into_source(self) -> RunnerSource {
        if let Some(problem) = self.problems.into_iter().next() {
            return RunnerSource::Invalid(problem);
        }
        if self.entries.is_empty() {
            return RunnerSource::Invalid(NO_TESTS_MSG.to_string());
        }

        let any_only = self.entries.iter().any(|(_, mark)| *mark == Mark::Only);
        let any_skip = self.entries.iter().any(|(_, mark)| *mark == Mark::Skip);

        if any_only {
            RunnerSource::OnlyFocused(keep(self.entries, Mark::Only))
        } else if any_skip {
            RunnerSource::Skipping(keep(self.entries, Mark::Normal))
        } else {
            RunnerSource::Plain(keep(self.entries, Mark::Normal))
        }
    }

    fn push<F>(&mut self, name: &str, mark: Mark, body: F) -> &mut Self
    where
        F: FnOnce() -> Vec<Outcome> + Send + 'static,
    {
        let mut labels = self.prefix.clone();
        labels.push(name.to_string());

        if name.trim().is_empty() {
            self.problems.push(blank_label_problem(&self.prefix));
        } else if !self.seen.insert(labels.clone()) {
            self.problems
                .push(format!("duplicate test name: {}", labels.join(" > ")));
        }

        self.entries.push((TestEntry::new(labels, body), mark));
        self
    }
}

fn keep(entries: Vec<(TestEntry, Mark)>, wanted: Mark) -> Vec<TestEntry> {
    entries
        .into_iter()
        .filter(|(_, mark)| *mark == wanted)
        .map(|(entry, _)| entry)
        .collect()
}

fn blank_label_problem(prefix: &[String]) -> String {
    if prefix.is_empty() {
        "blank test name at top level".to_string()
    } else {
        format!("blank test name under {}", prefix.join(" > "))
    }
}
