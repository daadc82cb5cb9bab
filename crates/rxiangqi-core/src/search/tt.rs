//! Transposition table for caching search results
//!
//! Fixed capacity, lock-free. Each slot is two `AtomicU64`s: the data word and
//! the key XORed with the data word, so a torn write or an index collision
//! fails verification instead of returning another position's result.

use crate::types::Move;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bound kind of a stored score
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    /// Exact score (PV node)
    Exact = 0,
    /// Lower bound (fail-high/cut node)
    LowerBound = 1,
    /// Upper bound (fail-low/all node)
    UpperBound = 2,
}

/// Unpacked transposition table entry
///
/// Data word layout:
/// - [63-48]: best move (16 bits, see `Move::to_u16`)
/// - [47-16]: score (32 bits)
/// - [15-8]: depth (8 bits)
/// - [7-6]: node type (2 bits)
/// - [5-0]: age (6 bits)
#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    data: u64,
}

impl TTEntry {
    fn pack(mv: Option<Move>, score: i32, depth: u8, node_type: NodeType, age: u8) -> u64 {
        let move_data = mv.map_or(0, Move::to_u16);
        ((move_data as u64) << 48)
            | ((score as u32 as u64) << 16)
            | ((depth as u64) << 8)
            | ((node_type as u64) << 6)
            | (age & 0x3F) as u64
    }

    /// Stored best move
    pub fn best_move(&self) -> Option<Move> {
        Move::from_u16(((self.data >> 48) & 0xFFFF) as u16)
    }

    #[inline]
    pub fn score(&self) -> i32 {
        ((self.data >> 16) & 0xFFFF_FFFF) as u32 as i32
    }

    #[inline]
    pub fn depth(&self) -> u8 {
        ((self.data >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        match (self.data >> 6) & 0x3 {
            0 => NodeType::Exact,
            1 => NodeType::LowerBound,
            _ => NodeType::UpperBound,
        }
    }

    #[inline]
    pub fn age(&self) -> u8 {
        (self.data & 0x3F) as u8
    }
}

/// Lock-free transposition table using atomic operations
pub struct TranspositionTable {
    /// Two words per entry: key ^ data, data
    table: Vec<AtomicU64>,
    /// Number of entries (power of two)
    size: usize,
    /// Current generation
    age: AtomicU64,
}

impl TranspositionTable {
    /// Create a table holding at most `entries` entries, rounded down to a
    /// power of two
    pub fn new(entries: usize) -> Self {
        let size = if entries.is_power_of_two() {
            entries
        } else {
            (entries.max(2).next_power_of_two() / 2).max(1)
        };
        let table = (0..size * 2).map(|_| AtomicU64::new(0)).collect();
        TranspositionTable {
            table,
            size,
            age: AtomicU64::new(0),
        }
    }

    /// Create a table sized in megabytes (16 bytes per entry)
    pub fn with_size_mb(size_mb: usize) -> Self {
        Self::new((size_mb.max(1) * 1024 * 1024) / 16)
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash as usize) & (self.size - 1)
    }

    #[inline]
    fn current_age(&self) -> u8 {
        (self.age.load(Ordering::Relaxed) & 0x3F) as u8
    }

    /// Probe the table; returns an entry only when the full key matches
    pub fn probe(&self, hash: u64) -> Option<TTEntry> {
        let base = self.index(hash) * 2;
        let check = self.table[base].load(Ordering::Relaxed);
        let data = self.table[base + 1].load(Ordering::Relaxed);
        let entry = TTEntry { data };
        if data != 0 && check ^ data == hash && entry.depth() > 0 {
            Some(entry)
        } else {
            None
        }
    }

    /// Store an entry
    ///
    /// Replacement: always overwrite a different position; for the same
    /// position overwrite when the old entry is from an older search or is
    /// not deeper than the new one.
    pub fn store(&self, hash: u64, mv: Option<Move>, score: i32, depth: u8, node_type: NodeType) {
        let base = self.index(hash) * 2;
        let age = self.current_age();

        let old_check = self.table[base].load(Ordering::Relaxed);
        let old_data = self.table[base + 1].load(Ordering::Relaxed);
        let old = TTEntry { data: old_data };
        let same_position = old_data != 0 && old_check ^ old_data == hash;

        let should_replace = !same_position
            || old.depth() == 0
            || old.age() != age
            || depth >= old.depth();
        if !should_replace {
            return;
        }

        // Keep an older best move when the new result has none
        let mv = mv.or_else(|| if same_position { old.best_move() } else { None });
        let data = TTEntry::pack(mv, score, depth, node_type, age);
        self.table[base].store(hash ^ data, Ordering::Relaxed);
        self.table[base + 1].store(data, Ordering::Relaxed);
    }

    /// Clear all entries and reset the generation
    pub fn clear(&self) {
        for slot in &self.table {
            slot.store(0, Ordering::Relaxed);
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Advance to the next generation
    pub fn new_search(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    /// Fill rate in permille, sampled over the first 1000 entries
    pub fn hashfull(&self) -> u16 {
        let sample = 1000.min(self.size);
        let filled = (0..sample)
            .filter(|&i| self.table[i * 2 + 1].load(Ordering::Relaxed) != 0)
            .count();
        ((filled * 1000) / sample) as u16
    }

    /// Capacity in entries
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_tt_entry_packing() {
        let mv = Some(Move::new(Square::new(7, 7), Square::new(7, 4)));
        let data = TTEntry::pack(mv, -123_456, 10, NodeType::LowerBound, 42);
        let entry = TTEntry { data };
        assert_eq!(entry.best_move(), mv);
        assert_eq!(entry.score(), -123_456);
        assert_eq!(entry.depth(), 10);
        assert_eq!(entry.node_type(), NodeType::LowerBound);
        assert_eq!(entry.age(), 42);
    }

    #[test]
    fn test_capacity_is_power_of_two() {
        assert_eq!(TranspositionTable::new(1000).size(), 512);
        assert_eq!(TranspositionTable::new(1024).size(), 1024);
        assert_eq!(TranspositionTable::new(0).size(), 1);
        assert_eq!(TranspositionTable::with_size_mb(1).size(), 65536);
    }

    #[test]
    fn test_transposition_table() {
        let tt = TranspositionTable::new(1024);
        let hash = 0x1234_5678_90AB_CDEF;
        let mv = Some(Move::new(Square::new(9, 1), Square::new(7, 2)));

        tt.store(hash, mv, 1500, 8, NodeType::LowerBound);

        let entry = tt.probe(hash).expect("Entry should be found");
        assert_eq!(entry.score(), 1500);
        assert_eq!(entry.depth(), 8);
        assert_eq!(entry.node_type(), NodeType::LowerBound);
        assert_eq!(entry.best_move(), mv);
        assert!(tt.probe(hash ^ 1).is_none());
    }

    #[test]
    fn test_tt_replacement() {
        let tt = TranspositionTable::new(1024);
        let hash = 0x1234_5678_90AB_CDEF;

        tt.store(hash, None, 100, 5, NodeType::Exact);
        // Deeper entry replaces
        tt.store(hash, None, 200, 10, NodeType::Exact);
        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.depth(), 10);
        assert_eq!(entry.score(), 200);

        // Shallower entry from the same search does not
        tt.store(hash, None, 300, 3, NodeType::Exact);
        assert_eq!(tt.probe(hash).unwrap().score(), 200);

        // After a new search the stale deep entry is overwritten
        tt.new_search();
        tt.store(hash, None, 400, 3, NodeType::UpperBound);
        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.score(), 400);
        assert_eq!(entry.node_type(), NodeType::UpperBound);
    }

    #[test]
    fn test_collision_is_never_trusted() {
        let tt = TranspositionTable::new(16);
        let a = 0xAAAA_0000_0000_0003;
        let b = 0xBBBB_0000_0000_0003; // same slot, different key
        tt.store(a, None, 10, 4, NodeType::Exact);
        assert!(tt.probe(b).is_none());

        tt.store(b, None, 20, 1, NodeType::Exact);
        assert!(tt.probe(a).is_none());
        assert_eq!(tt.probe(b).unwrap().score(), 20);
    }

    #[test]
    fn test_clear_and_hashfull() {
        let tt = TranspositionTable::new(64);
        for i in 0..64u64 {
            tt.store(i, None, 1, 1, NodeType::Exact);
        }
        assert_eq!(tt.hashfull(), 1000);
        tt.clear();
        assert_eq!(tt.hashfull(), 0);
        assert!(tt.probe(3).is_none());
    }
}
