//! Reference board implementation
//!
//! A plain 90-cell mailbox with the full xiangqi movement rules: palace and
//! river limits, horse legs, elephant eyes, cannon screens and the
//! flying-general rule.

use crate::board::{Board, BoardSetup};
use crate::fen::{self, CodecError};
use crate::types::{COLS, Color, Move, Piece, PieceKind, ROWS, SQUARE_NB, Square};
use std::fmt;

const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ELEPHANT_STEPS: [(i8, i8); 4] = [(-2, -2), (-2, 2), (2, -2), (2, 2)];
const HORSE_STEPS: [(i8, i8); 8] =
    [(-2, -1), (-2, 1), (2, -1), (2, 1), (-1, -2), (1, -2), (-1, 2), (1, 2)];

#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    cells: [Option<Piece>; SQUARE_NB],
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl Position {
    /// Standard initial setup
    pub fn startpos() -> Self {
        // STARTPOS_FEN is a constant and always parses
        match Position::from_fen(fen::STARTPOS_FEN) {
            Ok((pos, _)) => pos,
            Err(_) => Position::empty(),
        }
    }

    /// Build from a position string, returning the side to move as well
    pub fn from_fen(s: &str) -> Result<(Self, Color), CodecError> {
        fen::decode_position(s)
    }

    pub fn to_fen(&self, side_to_move: Color) -> String {
        fen::encode_position(self, side_to_move)
    }

    /// Build from (square, piece) pairs on an otherwise empty board
    pub fn from_pieces<I>(pieces: I) -> Self
    where
        I: IntoIterator<Item = (Square, Piece)>,
    {
        let mut pos = Position::empty();
        for (sq, piece) in pieces {
            pos.cells[sq.index()] = Some(piece);
        }
        pos
    }

    #[inline]
    fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()]
    }

    fn general_square(&self, color: Color) -> Option<Square> {
        Square::all().find(|&sq| {
            self.get(sq).is_some_and(|p| p.kind == PieceKind::General && p.color == color)
        })
    }

    /// Pieces strictly between two squares on the same row or column
    fn count_between(&self, from: Square, to: Square) -> Option<usize> {
        if from.row() == to.row() {
            let (lo, hi) = ordered(from.col(), to.col());
            Some(((lo + 1)..hi).filter(|&c| self.get(Square::new(from.row(), c)).is_some()).count())
        } else if from.col() == to.col() {
            let (lo, hi) = ordered(from.row(), to.row());
            Some(((lo + 1)..hi).filter(|&r| self.get(Square::new(r, from.col())).is_some()).count())
        } else {
            None
        }
    }

    /// Generals on the same file with nothing between them
    fn generals_facing(&self) -> bool {
        match (self.general_square(Color::Red), self.general_square(Color::Black)) {
            (Some(red), Some(black)) => {
                red.col() == black.col() && self.count_between(red, black) == Some(0)
            }
            _ => false,
        }
    }

    /// Movement geometry of `piece` from `from` to `to`, ignoring who
    /// occupies `to`
    fn reaches(&self, piece: Piece, from: Square, to: Square) -> bool {
        if from == to {
            return false;
        }
        let dr = to.row() as i8 - from.row() as i8;
        let dc = to.col() as i8 - from.col() as i8;
        let color = piece.color;
        match piece.kind {
            PieceKind::General => dr.abs() + dc.abs() == 1 && to.in_palace(color),
            PieceKind::Advisor => dr.abs() == 1 && dc.abs() == 1 && to.in_palace(color),
            PieceKind::Elephant => {
                dr.abs() == 2
                    && dc.abs() == 2
                    && to.on_own_side(color)
                    && from.offset(dr / 2, dc / 2).is_some_and(|eye| self.get(eye).is_none())
            }
            PieceKind::Horse => {
                let leg = match (dr.abs(), dc.abs()) {
                    (2, 1) => from.offset(dr / 2, 0),
                    (1, 2) => from.offset(0, dc / 2),
                    _ => return false,
                };
                leg.is_some_and(|leg| self.get(leg).is_none())
            }
            PieceKind::Chariot => self.count_between(from, to) == Some(0),
            PieceKind::Cannon => {
                let screens = if self.get(to).is_some() { 1 } else { 0 };
                self.count_between(from, to) == Some(screens)
            }
            PieceKind::Soldier => {
                (dr == color.forward() && dc == 0)
                    || (!from.on_own_side(color) && dr == 0 && dc.abs() == 1)
            }
        }
    }

    fn push_if_open(&self, color: Color, to: Option<Square>, out: &mut Vec<Square>) {
        if let Some(to) = to {
            if self.get(to).is_none_or(|p| p.color != color) {
                out.push(to);
            }
        }
    }

    fn slide_targets(&self, from: Square, color: Color, cannon: bool, out: &mut Vec<Square>) {
        for (dr, dc) in ORTHOGONAL {
            let mut screened = false;
            let mut cur = from.offset(dr, dc);
            while let Some(sq) = cur {
                match self.get(sq) {
                    None => {
                        if !screened {
                            out.push(sq);
                        }
                    }
                    Some(p) => {
                        if cannon && !screened {
                            screened = true;
                        } else {
                            if p.color != color {
                                out.push(sq);
                            }
                            break;
                        }
                    }
                }
                cur = sq.offset(dr, dc);
            }
        }
    }
}

#[inline]
fn ordered(a: u8, b: u8) -> (u8, u8) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Board for Position {
    #[inline]
    fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.get(sq)
    }

    fn is_legal_move(&self, piece: Piece, from: Square, to: Square) -> bool {
        if self.get(to).is_some_and(|t| t.color == piece.color) {
            return false;
        }
        self.reaches(piece, from, to)
    }

    fn is_move_safe(&self, from: Square, to: Square, color: Color) -> bool {
        let mut next = self.clone();
        next.apply_move(Move::new(from, to));
        !next.in_check(color)
    }

    #[inline]
    fn apply_move(&mut self, mv: Move) {
        let piece = self.cells[mv.from.index()].take();
        self.cells[mv.to.index()] = piece;
    }

    fn in_check(&self, color: Color) -> bool {
        let Some(general) = self.general_square(color) else {
            return false;
        };
        if self.generals_facing() {
            return true;
        }
        Square::all().any(|sq| {
            self.get(sq).is_some_and(|p| p.color != color && self.reaches(p, sq, general))
        })
    }

    fn pieces(&self) -> Vec<(Square, Piece)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| Some((Square::from_index(i)?, (*cell)?)))
            .collect()
    }

    fn piece_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn targets(&self, from: Square) -> Vec<Square> {
        let Some(piece) = self.get(from) else {
            return Vec::new();
        };
        let color = piece.color;
        let mut out = Vec::with_capacity(17);
        match piece.kind {
            PieceKind::General => {
                for (dr, dc) in ORTHOGONAL {
                    let to = from.offset(dr, dc).filter(|sq| sq.in_palace(color));
                    self.push_if_open(color, to, &mut out);
                }
            }
            PieceKind::Advisor => {
                for (dr, dc) in DIAGONAL {
                    let to = from.offset(dr, dc).filter(|sq| sq.in_palace(color));
                    self.push_if_open(color, to, &mut out);
                }
            }
            PieceKind::Elephant => {
                for (dr, dc) in ELEPHANT_STEPS {
                    let blocked =
                        from.offset(dr / 2, dc / 2).is_none_or(|eye| self.get(eye).is_some());
                    if blocked {
                        continue;
                    }
                    let to = from.offset(dr, dc).filter(|sq| sq.on_own_side(color));
                    self.push_if_open(color, to, &mut out);
                }
            }
            PieceKind::Horse => {
                for (dr, dc) in HORSE_STEPS {
                    let leg = if dr.abs() == 2 { from.offset(dr / 2, 0) } else { from.offset(0, dc / 2) };
                    if leg.is_none_or(|leg| self.get(leg).is_some()) {
                        continue;
                    }
                    self.push_if_open(color, from.offset(dr, dc), &mut out);
                }
            }
            PieceKind::Chariot => self.slide_targets(from, color, false, &mut out),
            PieceKind::Cannon => self.slide_targets(from, color, true, &mut out),
            PieceKind::Soldier => {
                self.push_if_open(color, from.offset(color.forward(), 0), &mut out);
                if !from.on_own_side(color) {
                    self.push_if_open(color, from.offset(0, -1), &mut out);
                    self.push_if_open(color, from.offset(0, 1), &mut out);
                }
            }
        }
        out
    }

    fn attacks(&self, from: Square, to: Square) -> bool {
        self.get(from).is_some_and(|p| self.reaches(p, from, to))
    }
}

impl BoardSetup for Position {
    fn empty() -> Self {
        Position {
            cells: [None; SQUARE_NB],
        }
    }

    #[inline]
    fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.index()] = piece;
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", fen::encode_placement(self))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            write!(f, "{} ", ROWS - 1 - row)?;
            for col in 0..COLS {
                let c = self.get(Square::new(row, col)).map_or('.', Piece::to_char);
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for col in 0..COLS {
            write!(f, " {}", (b'a' + col) as char)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GameState;

    fn piece(kind: PieceKind, color: Color) -> Piece {
        Piece::new(kind, color)
    }

    fn kings() -> Vec<(Square, Piece)> {
        vec![
            (Square::new(9, 4), piece(PieceKind::General, Color::Red)),
            (Square::new(0, 3), piece(PieceKind::General, Color::Black)),
        ]
    }

    #[test]
    fn test_startpos_move_count() {
        let pos = Position::startpos();
        assert_eq!(pos.piece_count(), 32);
        // Well-known figure for the xiangqi initial position
        assert_eq!(pos.legal_moves(Color::Red).len(), 44);
        assert_eq!(pos.legal_moves(Color::Black).len(), 44);
    }

    #[test]
    fn test_targets_match_rule_scan() {
        let pos = Position::from_fen(
            "r1bakab1r/9/1cn4c1/p1p1p1p1p/9/2P6/P3P1P1P/1C2C1N2/9/RNBAKAB1R b - - 0 1",
        )
        .unwrap()
        .0;
        for (from, p) in pos.pieces() {
            let mut fast = pos.targets(from);
            let mut slow: Vec<Square> =
                Square::all().filter(|&to| pos.is_legal_move(p, from, to)).collect();
            fast.sort();
            slow.sort();
            assert_eq!(fast, slow, "mismatch for {p} on {from}");
        }
    }

    #[test]
    fn test_horse_leg_blocks() {
        let mut pieces = kings();
        pieces.push((Square::new(5, 4), piece(PieceKind::Horse, Color::Red)));
        pieces.push((Square::new(4, 4), piece(PieceKind::Soldier, Color::Red)));
        let pos = Position::from_pieces(pieces);
        let horse = piece(PieceKind::Horse, Color::Red);
        assert!(!pos.is_legal_move(horse, Square::new(5, 4), Square::new(3, 3)));
        assert!(pos.is_legal_move(horse, Square::new(5, 4), Square::new(7, 3)));
    }

    #[test]
    fn test_cannon_needs_screen_to_capture() {
        let mut pieces = kings();
        pieces.push((Square::new(7, 1), piece(PieceKind::Cannon, Color::Red)));
        pieces.push((Square::new(2, 1), piece(PieceKind::Horse, Color::Black)));
        let pos = Position::from_pieces(pieces.clone());
        let cannon = piece(PieceKind::Cannon, Color::Red);
        assert!(!pos.is_legal_move(cannon, Square::new(7, 1), Square::new(2, 1)));

        pieces.push((Square::new(5, 1), piece(PieceKind::Soldier, Color::Black)));
        let pos = Position::from_pieces(pieces);
        assert!(pos.is_legal_move(cannon, Square::new(7, 1), Square::new(2, 1)));
        assert!(!pos.is_legal_move(cannon, Square::new(7, 1), Square::new(4, 1)));
    }

    #[test]
    fn test_soldier_moves_sideways_after_river() {
        let mut pieces = kings();
        pieces.push((Square::new(6, 2), piece(PieceKind::Soldier, Color::Red)));
        pieces.push((Square::new(4, 6), piece(PieceKind::Soldier, Color::Red)));
        let pos = Position::from_pieces(pieces);
        assert_eq!(pos.targets(Square::new(6, 2)), vec![Square::new(5, 2)]);
        let mut crossed = pos.targets(Square::new(4, 6));
        crossed.sort();
        assert_eq!(crossed, vec![Square::new(3, 6), Square::new(4, 5), Square::new(4, 7)]);
    }

    #[test]
    fn test_elephant_cannot_cross_river() {
        let mut pieces = kings();
        pieces.push((Square::new(5, 2), piece(PieceKind::Elephant, Color::Red)));
        let pos = Position::from_pieces(pieces);
        let mut targets = pos.targets(Square::new(5, 2));
        targets.sort();
        assert_eq!(targets, vec![Square::new(7, 0), Square::new(7, 4)]);
    }

    #[test]
    fn test_flying_general_counts_as_check() {
        let pos = Position::from_pieces(vec![
            (Square::new(9, 4), piece(PieceKind::General, Color::Red)),
            (Square::new(0, 4), piece(PieceKind::General, Color::Black)),
        ]);
        assert!(pos.in_check(Color::Red));
        assert!(pos.in_check(Color::Black));

        let pos = Position::from_pieces(kings());
        assert!(!pos.in_check(Color::Red));
        // Red general may not step onto the open file
        assert!(!pos.is_move_safe(Square::new(9, 4), Square::new(9, 3), Color::Red));
        assert!(pos.is_move_safe(Square::new(9, 4), Square::new(8, 4), Color::Red));
    }

    #[test]
    fn test_mate_detection() {
        // Double chariot mate against the black general
        let pos = Position::from_pieces(vec![
            (Square::new(0, 4), piece(PieceKind::General, Color::Black)),
            (Square::new(9, 3), piece(PieceKind::General, Color::Red)),
            (Square::new(1, 0), piece(PieceKind::Chariot, Color::Red)),
            (Square::new(0, 8), piece(PieceKind::Chariot, Color::Red)),
        ]);
        assert!(pos.in_check(Color::Black));
        assert_eq!(pos.game_state(Color::Black), GameState::Checkmate);
        assert_eq!(pos.game_state(Color::Red), GameState::Ongoing);
    }

    #[test]
    fn test_defender_attacks() {
        let pos = Position::startpos();
        // Red chariot on a9 defends the horse on b9
        assert!(pos.attacks(Square::new(9, 0), Square::new(9, 1)));
        assert!(!pos.is_legal_move(
            piece(PieceKind::Chariot, Color::Red),
            Square::new(9, 0),
            Square::new(9, 1)
        ));
    }
}
