//! Reversible edit history for the live stat line.
//!
//! Entries carry everything needed to compute their own inverse, so undo
//! is a pop plus one clamped apply (or a snapshot restore). Strictly
//! last-in-first-out; there is no redo. The log lives only for the
//! current session: it is never persisted and is discarded on finalize.

use std::collections::VecDeque;

use crate::stats::{StatKey, StatLine};

/// Bound on stored entries; the oldest are dropped silently.
pub const HISTORY_CAP: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// `delta` was added to `key`.
    Increment { key: StatKey, delta: u32 },
    /// `delta` was subtracted from `key`. The recorded delta is the
    /// effective change after clamping, so the inverse is exact.
    Decrement { key: StatKey, delta: u32 },
    /// The line was zeroed; `before` is the full pre-reset snapshot.
    Reset { before: StatLine },
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    cap: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self { entries: VecDeque::with_capacity(cap.min(HISTORY_CAP)), cap: cap.max(1) }
    }

    /// Append an entry, dropping the oldest when full.
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Pop the most recent entry and return its inverse applied to
    /// `counts`. `None` when the log is empty; nothing is mutated and the
    /// caller keeps `counts` as is.
    pub fn undo(&mut self, counts: &StatLine) -> Option<StatLine> {
        let entry = self.entries.pop_back()?;
        Some(match entry {
            HistoryEntry::Increment { key, delta } => counts.apply(key, -(delta as i32)),
            HistoryEntry::Decrement { key, delta } => counts.apply(key, delta as i32),
            HistoryEntry::Reset { before } => before,
        })
    }

    /// Discard all entries. Called on finalize and on starting a new
    /// draft.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
