//! Tunable evaluation and search parameters
//!
//! Everything the evaluator and searcher read is held here and passed in at
//! construction time, so several searchers with different settings can run
//! side by side.

use crate::types::{COLS, PieceKind, ROWS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Piece-square table from Red's point of view (row 0 = Black's back rank).
/// Black pieces read it mirrored.
pub type PieceSquareTable = [[i32; COLS as usize]; ROWS as usize];

const SOLDIER_TABLE: PieceSquareTable = [
    [50, 60, 70, 80, 90, 80, 70, 60, 50],
    [40, 50, 60, 70, 80, 70, 60, 50, 40],
    [30, 40, 50, 60, 70, 60, 50, 40, 30],
    [20, 30, 40, 50, 60, 50, 40, 30, 20],
    [10, 20, 30, 40, 50, 40, 30, 20, 10],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const HORSE_TABLE: PieceSquareTable = [
    [0, 5, 10, 15, 20, 15, 10, 5, 0],
    [5, 10, 20, 25, 30, 25, 20, 10, 5],
    [10, 20, 30, 35, 40, 35, 30, 20, 10],
    [15, 25, 35, 40, 45, 40, 35, 25, 15],
    [20, 30, 40, 45, 50, 45, 40, 30, 20],
    [20, 30, 40, 45, 50, 45, 40, 30, 20],
    [15, 25, 35, 40, 45, 40, 35, 25, 15],
    [10, 20, 30, 35, 40, 35, 30, 20, 10],
    [5, 10, 20, 25, 30, 25, 20, 10, 5],
    [0, 5, 10, 15, 20, 15, 10, 5, 0],
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Material values indexed by `PieceKind::index()`
    pub piece_values: [i32; PieceKind::NUM],
    pub soldier_table: PieceSquareTable,
    pub horse_table: PieceSquareTable,
    pub mobility_weight: i32,
    pub safety_weight: i32,
    pub control_weight: i32,
    pub tactical_weight: i32,
    /// Raw tactical units, multiplied by `tactical_weight`
    pub check_bonus: i32,
    pub fork_bonus: i32,
    pub pin_bonus: i32,
    pub discovered_bonus: i32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            piece_values: [10_000, 200, 200, 400, 900, 450, 100],
            soldier_table: SOLDIER_TABLE,
            horse_table: HORSE_TABLE,
            mobility_weight: 10,
            safety_weight: 15,
            control_weight: 20,
            tactical_weight: 1,
            check_bonus: 100,
            fork_bonus: 50,
            pin_bonus: 30,
            discovered_bonus: 40,
        }
    }
}

impl EvalConfig {
    #[inline]
    pub fn value(&self, kind: PieceKind) -> i32 {
        self.piece_values[kind.index()]
    }

    /// Evaluation with only material and piece-square terms
    pub fn material_only() -> Self {
        EvalConfig {
            mobility_weight: 0,
            safety_weight: 0,
            control_weight: 0,
            tactical_weight: 0,
            ..EvalConfig::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Deepest iteration of iterative deepening
    pub max_depth: u8,
    /// Scores beyond this magnitude stop iterative deepening
    pub decisive_score: i32,
    /// Wall-clock budget for one search
    #[serde(with = "millis_opt")]
    pub time_limit: Option<Duration>,
    /// Transposition table capacity in entries (rounded down to a power of two)
    pub tt_entries: usize,
    pub use_tt: bool,
    pub use_book: bool,
    /// Minimum piece count for the opening book to apply
    pub opening_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 6,
            decisive_score: super::DECISIVE_SCORE,
            time_limit: None,
            tt_entries: 1 << 18,
            use_tt: true,
            use_book: true,
            opening_threshold: 30,
        }
    }
}

impl SearchConfig {
    pub fn with_depth(max_depth: u8) -> Self {
        SearchConfig {
            max_depth,
            ..SearchConfig::default()
        }
    }
}

mod millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_symmetric_by_file() {
        for table in [SOLDIER_TABLE, HORSE_TABLE] {
            for row in table {
                for col in 0..COLS as usize {
                    assert_eq!(row[col], row[COLS as usize - 1 - col]);
                }
            }
        }
    }

    #[test]
    fn test_search_config_json_defaults() {
        let cfg: SearchConfig = serde_json::from_str(r#"{"max_depth": 4, "time_limit": 250}"#).unwrap();
        assert_eq!(cfg.max_depth, 4);
        assert_eq!(cfg.time_limit, Some(Duration::from_millis(250)));
        assert!(cfg.use_tt);
        assert_eq!(cfg.opening_threshold, 30);
    }
}
