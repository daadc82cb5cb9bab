//! Local adversarial search
//!
//! Iterative deepening over an alpha-beta core, backed by a bounded
//! transposition table, a small opening book and a heuristic evaluator.

pub mod book;
pub mod config;
pub mod evaluate;
pub mod ordering;
pub mod searcher;
pub mod tt;

pub use book::OpeningBook;
pub use config::{EvalConfig, SearchConfig};
pub use evaluate::{EvalBreakdown, Evaluator};
pub use searcher::{MoveSource, SearchInfo, SearchLimits, SearchResult, Searcher};
pub use tt::{NodeType, TranspositionTable};

/// Base score for a mated side (plus remaining depth)
pub const MATE_SCORE: i32 = 100_000;
/// Larger than any reachable score
pub const INFINITE: i32 = 1_000_000;
/// Scores beyond this are treated as won/lost
pub const DECISIVE_SCORE: i32 = 50_000;

pub const MIN_SEARCH_DEPTH: u8 = 2;
pub const MAX_SEARCH_DEPTH: u8 = 14;

/// Maximum search depth for a difficulty level (monotonic, bounded)
pub fn depth_for_difficulty(difficulty: u8) -> u8 {
    difficulty.saturating_mul(2).clamp(MIN_SEARCH_DEPTH, MAX_SEARCH_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_for_difficulty_is_monotonic_and_bounded() {
        assert_eq!(depth_for_difficulty(0), MIN_SEARCH_DEPTH);
        assert_eq!(depth_for_difficulty(2), 4);
        assert_eq!(depth_for_difficulty(10), MAX_SEARCH_DEPTH);
        assert_eq!(depth_for_difficulty(255), MAX_SEARCH_DEPTH);
        for d in 1..20u8 {
            assert!(depth_for_difficulty(d) <= depth_for_difficulty(d + 1));
        }
    }
}
