//! Bounded ring of recently accepted move tokens

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 6;
/// Occurrences in the ring that make a token repetitive
pub const REPEAT_LIMIT: usize = 2;

/// Insertion-ordered tokens of this player's own accepted moves
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveHistory {
    moves: VecDeque<String>,
    capacity: usize,
}

impl Default for MoveHistory {
    fn default() -> Self {
        MoveHistory::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl MoveHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        MoveHistory {
            moves: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.moves.back().map(String::as_str)
    }

    /// Append, evicting the oldest entries past capacity
    pub fn push(&mut self, token: impl Into<String>) {
        self.moves.push_back(token.into());
        while self.moves.len() > self.capacity {
            self.moves.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// A-B-A oscillation (equal to the move two back but not the last one),
    /// or already played [`REPEAT_LIMIT`] times within the ring
    pub fn is_repetitive(&self, token: &str) -> bool {
        let n = self.moves.len();
        if n < 2 {
            return false;
        }
        if self.moves[n - 2] == token && self.moves[n - 1] != token {
            return true;
        }
        self.moves.iter().filter(|m| *m == token).count() >= REPEAT_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(tokens: &[&str]) -> MoveHistory {
        let mut h = MoveHistory::default();
        for t in tokens {
            h.push(*t);
        }
        h
    }

    #[test]
    fn test_short_history_never_repetitive() {
        assert!(!MoveHistory::default().is_repetitive("h2e2"));
        assert!(!history(&["h2e2"]).is_repetitive("h2e2"));
    }

    #[test]
    fn test_oscillation_is_flagged() {
        let h = history(&["b0c2", "h2e2", "c2b0"]);
        assert!(h.is_repetitive("h2e2"));
        assert!(!h.is_repetitive("c2b0"));
        assert!(!h.is_repetitive("a0a1"));
    }

    #[test]
    fn test_double_occurrence_is_flagged() {
        let h = history(&["h2e2", "a0a1", "h2e2", "b0c2", "c3c4"]);
        assert!(h.is_repetitive("h2e2"));
        // Once is fine
        assert!(!h.is_repetitive("a0a1"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut h = MoveHistory::new(3);
        for t in ["a", "b", "c", "d"] {
            h.push(t);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
        assert_eq!(h.last(), Some("d"));
        h.clear();
        assert!(h.is_empty());
        assert_eq!(MoveHistory::new(0).capacity(), 1);
    }
}
