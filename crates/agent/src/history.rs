//! Bounded recent-utterance history
//!
//! Used only as retrieval context for short follow-up questions. Capped at a
//! handful of entries with FIFO eviction; never persisted.

use std::collections::VecDeque;

/// Default history cap
pub const DEFAULT_CAP: usize = 5;

/// Bounded FIFO buffer of recent user utterances, most-recent-last
#[derive(Debug, Clone)]
pub struct RecentHistory {
    entries: VecDeque<String>,
    cap: usize,
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAP)
    }
}

impl RecentHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append an utterance, evicting the oldest entry at capacity
    pub fn push(&mut self, utterance: impl Into<String>) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(utterance.into());
    }

    /// The `n` most recent utterances, oldest first
    pub fn window(&self, n: usize) -> Vec<&str> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
