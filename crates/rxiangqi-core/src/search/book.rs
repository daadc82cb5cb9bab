//! Opening book
//!
//! Per side, an ordered list of preferred opening moves. While the board still
//! holds at least `min_pieces` pieces, the first candidate that is legal and
//! safe for the side to move is played.

use crate::board::Board;
use crate::types::{Color, Move, Square};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningBook {
    red: Vec<Move>,
    black: Vec<Move>,
    min_pieces: usize,
}

impl Default for OpeningBook {
    /// Central cannon for Red, answered by the same-direction cannon for Black
    fn default() -> Self {
        let mv = |r1, c1, r2, c2| Move::new(Square::new(r1, c1), Square::new(r2, c2));
        OpeningBook {
            red: vec![mv(7, 1, 7, 4), mv(9, 1, 7, 2), mv(6, 4, 5, 4)],
            black: vec![mv(2, 7, 2, 5), mv(0, 7, 2, 6), mv(3, 4, 4, 4)],
            min_pieces: 30,
        }
    }
}

impl OpeningBook {
    pub fn new(red: Vec<Move>, black: Vec<Move>, min_pieces: usize) -> Self {
        OpeningBook {
            red,
            black,
            min_pieces,
        }
    }

    pub fn with_min_pieces(mut self, min_pieces: usize) -> Self {
        self.min_pieces = min_pieces;
        self
    }

    pub fn min_pieces(&self) -> usize {
        self.min_pieces
    }

    pub fn candidates(&self, side: Color) -> &[Move] {
        match side {
            Color::Red => &self.red,
            Color::Black => &self.black,
        }
    }

    /// First applicable book move for `side`, if the opening phase still holds
    pub fn lookup<B: Board>(&self, board: &B, side: Color) -> Option<Move> {
        if board.piece_count() < self.min_pieces {
            return None;
        }
        self.candidates(side).iter().copied().find(|&mv| board.is_valid_move(mv, side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn test_first_candidate_from_startpos() {
        let book = OpeningBook::default();
        let pos = Position::startpos();
        assert_eq!(
            book.lookup(&pos, Color::Red),
            Some(Move::new(Square::new(7, 1), Square::new(7, 4)))
        );
        assert_eq!(
            book.lookup(&pos, Color::Black),
            Some(Move::new(Square::new(2, 7), Square::new(2, 5)))
        );
    }

    #[test]
    fn test_skips_played_candidates() {
        let book = OpeningBook::default();
        let mut pos = Position::startpos();
        pos.apply_move(Move::new(Square::new(7, 1), Square::new(7, 4)));
        pos.apply_move(Move::new(Square::new(2, 7), Square::new(2, 5)));
        assert_eq!(
            book.lookup(&pos, Color::Red),
            Some(Move::new(Square::new(9, 1), Square::new(7, 2)))
        );
    }

    #[test]
    fn test_inactive_below_threshold() {
        let book = OpeningBook::default().with_min_pieces(33);
        assert_eq!(book.lookup(&Position::startpos(), Color::Red), None);
    }
}
