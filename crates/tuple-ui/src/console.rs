//! Console pane contents: a bounded, timestamped log of command output.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local};

/// What produced a console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The command line that was launched
    Invocation,
    /// Standard output of a command
    Output,
    /// Standard error or a launch failure, shown highlighted
    Error,
    /// Messages from the front-end itself
    Notice,
}

/// One console line (possibly multi-line text).
#[derive(Debug, Clone)]
pub struct ConsoleEntry {
    pub timestamp: DateTime<Local>,
    pub kind: EntryKind,
    pub text: String,
}

impl ConsoleEntry {
    #[must_use]
    pub fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self { timestamp: Local::now(), kind, text: text.into() }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == EntryKind::Error
    }
}

impl fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Bounded history; the oldest entries are dropped first.
#[derive(Debug)]
pub struct ConsoleLog {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
}

impl ConsoleLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity.min(64)), capacity }
    }

    /// Append an entry, returning it for display.
    pub fn push(&mut self, kind: EntryKind, text: impl Into<String>) -> &ConsoleEntry {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ConsoleEntry::new(kind, text));
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
