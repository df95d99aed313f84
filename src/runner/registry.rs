//! Registry of pending tests keyed by dense integer id.
//!
//! Entries live in an index-addressed arena. [`Registry::take`] moves an entry out and leaves a tombstone, so a
//! test id can be dispatched at most once for the lifetime of a run.

use std::fmt;

use conductor_core::Outcome;

/// Dense, zero-based test identifier assigned by enumeration order at init.
pub type TestId = usize;

/// Zero-argument test body.
pub type Thunk = Box<dyn FnOnce() -> Vec<Outcome> + Send + 'static>;

/// A runnable test: its label path plus the body that produces its outcomes.
pub struct TestEntry {
    labels: Vec<String>,
    thunk: Thunk,
}

impl TestEntry {
    pub fn new<F>(labels: Vec<String>, body: F) -> Self
    where
        F: FnOnce() -> Vec<Outcome> + Send + 'static,
    {
        Self {
            labels,
            thunk: Box::new(body),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn into_parts(self) -> (Vec<String>, Thunk) {
        (self.labels, self.thunk)
    }
}

impl fmt::Debug for TestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEntry").field("labels", &self.labels).finish_non_exhaustive()
    }
}

/// Pending tests, consumed at dispatch.
#[derive(Debug, Default)]
pub struct Registry {
    slots: Vec<Option<TestEntry>>,
    remaining: usize,
}

impl Registry {
    /// Index `entries` as ids `0..entries.len()`.
    pub fn from_entries(entries: Vec<TestEntry>) -> Self {
        let remaining = entries.len();
        Self {
            slots: entries.into_iter().map(Some).collect(),
            remaining,
        }
    }

    /// Number of tests registered at init, dispatched or not.
    pub fn test_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of tests not yet dispatched.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Remove and return the entry for `id`. Returns `None` if the id was never registered or was already taken.
    pub fn take(&mut self, id: TestId) -> Option<TestEntry> {
        let entry = self.slots.get_mut(id)?.take()?;
        self.remaining -= 1;
        Some(entry)
    }
}
