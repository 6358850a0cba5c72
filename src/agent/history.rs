//! Bounded conversation history.
//!
//! History is mutated only by the worker running a turn, but a UI thread may
//! take snapshots at any time, so every access goes through one mutex.

use crate::types::Message;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only message log with oldest-first eviction.
#[derive(Debug, Default)]
pub struct History {
    inner: Mutex<HistoryState>,
}

#[derive(Debug, Default)]
struct HistoryState {
    messages: VecDeque<Message>,
    /// Maximum retained messages; 0 means unlimited.
    max_len: usize,
}

impl HistoryState {
    fn trim(&mut self) -> usize {
        if self.max_len == 0 {
            return 0;
        }
        let overflow = self.messages.len().saturating_sub(self.max_len);
        self.messages.drain(..overflow);
        overflow
    }
}

impl History {
    /// Create an empty history with the given bound (0 = unlimited).
    pub fn new(max_len: usize) -> Self {
        Self {
            inner: Mutex::new(HistoryState {
                messages: VecDeque::new(),
                max_len,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one message, evicting the oldest entries past the bound.
    pub fn push(&self, message: Message) {
        let mut state = self.lock();
        state.messages.push_back(message);
        let evicted = state.trim();
        if evicted > 0 {
            tracing::debug!(evicted, "trimmed conversation history");
        }
    }

    /// Append an `(assistant reply, observation)` pair under one lock so a
    /// concurrent snapshot never sees half of it.
    pub fn push_pair(&self, first: Message, second: Message) {
        let mut state = self.lock();
        state.messages.push_back(first);
        state.messages.push_back(second);
        state.trim();
    }

    /// Change the bound and trim immediately.
    pub fn set_max_len(&self, max_len: usize) {
        let mut state = self.lock();
        state.max_len = max_len;
        state.trim();
    }

    pub fn max_len(&self) -> usize {
        self.lock().max_len
    }

    /// Copy of the current messages, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    pub fn clear(&self) {
        self.lock().messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Message {
        Message::user(format!("m{n}"))
    }

    #[test]
    fn unlimited_history_keeps_everything() {
        let history = History::new(0);
        for n in 0..50 {
            history.push(numbered(n));
        }
        assert_eq!(history.len(), 50);
    }

    #[test]
    fn bounded_history_keeps_most_recent_in_order() {
        let history = History::new(5);
        for n in 0..7 {
            history.push(numbered(n));
        }
        let contents: Vec<String> = history.snapshot().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn history_never_exceeds_bound() {
        let history = History::new(3);
        for n in 0..20 {
            if n % 2 == 0 {
                history.push(numbered(n));
            } else {
                history.push_pair(numbered(n), numbered(n + 100));
            }
            assert!(history.len() <= 3);
        }
    }

    #[test]
    fn lowering_the_bound_trims_immediately() {
        let history = History::new(0);
        for n in 0..6 {
            history.push(numbered(n));
        }
        history.set_max_len(2);
        assert_eq!(history.max_len(), 2);
        let contents: Vec<String> = history.snapshot().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["m4", "m5"]);
    }

    #[test]
    fn clear_empties_history() {
        let history = History::new(0);
        history.push(numbered(1));
        history.clear();
        assert!(history.is_empty());
    }
}
