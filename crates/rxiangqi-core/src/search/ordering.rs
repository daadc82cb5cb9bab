//! Move ordering heuristics

use super::config::EvalConfig;
use crate::board::Board;
use crate::types::Move;

/// Score added to the hash move so it is searched first
const HASH_MOVE_BONUS: i32 = 1_000_000;
/// Bonus for landing in the central band
const CENTER_BONUS: i32 = 10;

/// Ordering score: captures by victim value minus a tenth of the mover's value,
/// plus a small bonus for central destinations
pub fn move_score<B: Board>(board: &B, mv: Move, config: &EvalConfig) -> i32 {
    let mut score = 0;
    if let Some(victim) = board.piece_at(mv.to) {
        score += config.value(victim.kind);
        if let Some(mover) = board.piece_at(mv.from) {
            score -= config.value(mover.kind) / 10;
        }
    }
    let (row, col) = (mv.to.row(), mv.to.col());
    if (3..=6).contains(&row) && (2..=6).contains(&col) {
        score += CENTER_BONUS;
    }
    score
}

/// Sort moves best-first; `hash_move` (if present in the list) goes first
pub fn order_moves<B: Board>(
    board: &B,
    moves: &mut [Move],
    hash_move: Option<Move>,
    config: &EvalConfig,
) {
    moves.sort_by_cached_key(|&mv| {
        let bonus = if Some(mv) == hash_move { HASH_MOVE_BONUS } else { 0 };
        std::cmp::Reverse(bonus + move_score(board, mv, config))
    });
}
