//! Board contract consumed by the move-decision subsystem
//!
//! The rules engine lives outside the decision code. Everything the search,
//! the codec and the orchestrator need is expressed through [`Board`]; the
//! crate's own [`Position`](crate::position::Position) is one implementation.

use crate::types::{Color, Move, Piece, Square};

/// Terminal status of a position for the side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    /// Side to move is in check and has no safe move
    Checkmate,
    /// Side to move is not in check but has no safe move (a loss in xiangqi)
    Stalemate,
    /// Side to move has no general on the board
    GeneralCaptured,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        self != GameState::Ongoing
    }
}

/// Read/modify access to a xiangqi board
///
/// Implementations must be cheap to clone: the search clones once per applied
/// move and worker threads receive their own copy.
pub trait Board: Clone + Send {
    /// Occupant of a cell, if any
    fn piece_at(&self, sq: Square) -> Option<Piece>;

    /// Whether `piece` standing on `from` may move to `to` under its movement
    /// rule. Must reject captures of the mover's own color. Does not consider
    /// whether the move exposes the mover's general.
    fn is_legal_move(&self, piece: Piece, from: Square, to: Square) -> bool;

    /// Whether moving `from -> to` leaves `color`'s general out of check
    fn is_move_safe(&self, from: Square, to: Square, color: Color) -> bool;

    /// Apply a move (captures by replacement)
    fn apply_move(&mut self, mv: Move);

    /// Whether `color`'s general is attacked
    fn in_check(&self, color: Color) -> bool;

    /// Terminal determination for `side` to move
    fn game_state(&self, side: Color) -> GameState {
        if !self
            .pieces()
            .iter()
            .any(|(_, p)| p.color == side && p.kind == crate::types::PieceKind::General)
        {
            return GameState::GeneralCaptured;
        }
        if !self.legal_moves(side).is_empty() {
            GameState::Ongoing
        } else if self.in_check(side) {
            GameState::Checkmate
        } else {
            GameState::Stalemate
        }
    }

    /// All occupied cells in row-major order
    fn pieces(&self) -> Vec<(Square, Piece)> {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p))).collect()
    }

    #[inline]
    fn piece_count(&self) -> usize {
        self.pieces().len()
    }

    /// Destinations reachable by the piece on `from` (rule-legal, not
    /// necessarily safe)
    fn targets(&self, from: Square) -> Vec<Square> {
        let Some(piece) = self.piece_at(from) else {
            return Vec::new();
        };
        Square::all().filter(|&to| self.is_legal_move(piece, from, to)).collect()
    }

    /// Whether the piece on `from` bears on `to` regardless of who occupies
    /// `to`. Used for defender counts; the default can only see attacks on
    /// empty or enemy cells.
    fn attacks(&self, from: Square, to: Square) -> bool {
        self.piece_at(from).is_some_and(|p| self.is_legal_move(p, from, to))
    }

    /// Rule-legal moves for `color` without the safety filter
    fn pseudo_legal_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in self.pieces() {
            if piece.color != color {
                continue;
            }
            moves.extend(self.targets(from).into_iter().map(|to| Move::new(from, to)));
        }
        moves
    }

    /// Legal and safe moves for `color`
    fn legal_moves(&self, color: Color) -> Vec<Move> {
        self.pseudo_legal_moves(color)
            .into_iter()
            .filter(|mv| self.is_move_safe(mv.from, mv.to, color))
            .collect()
    }

    /// Full validity check: a `color` piece on `from`, no own-color capture,
    /// the movement rule holds and the general stays safe
    fn is_valid_move(&self, mv: Move, color: Color) -> bool {
        let Some(piece) = self.piece_at(mv.from) else {
            return false;
        };
        if piece.color != color {
            return false;
        }
        if self.piece_at(mv.to).is_some_and(|t| t.color == color) {
            return false;
        }
        self.is_legal_move(piece, mv.from, mv.to) && self.is_move_safe(mv.from, mv.to, color)
    }
}

/// Construction access for boards built from a decoded position
pub trait BoardSetup: Board {
    /// Board with no pieces
    fn empty() -> Self;

    /// Place or clear a cell
    fn set_piece(&mut self, sq: Square, piece: Option<Piece>);
}
