//! Basic xiangqi types: colors, pieces, squares and moves
//!
//! The board is 10 rows by 9 columns. Row 0 is Black's back rank (top of the
//! diagram), row 9 is Red's back rank. Red moves first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// Number of rows (ranks)
pub const ROWS: u8 = 10;
/// Number of columns (files)
pub const COLS: u8 = 9;
/// Number of cells on the board
pub const SQUARE_NB: usize = ROWS as usize * COLS as usize;

/// Side to move / piece owner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    pub const NUM: usize = 2;
    pub const ALL: [Color; 2] = [Color::Red, Color::Black];

    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction of a forward step in row units
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Black => "Black",
        }
    }
}

impl Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.opponent()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Piece types (7 types)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    General = 0,  // K
    Advisor = 1,  // A
    Elephant = 2, // B
    Horse = 3,    // N
    Chariot = 4,  // R
    Cannon = 5,   // C
    Soldier = 6,  // P
}

impl PieceKind {
    pub const NUM: usize = 7;
    pub const ALL: [PieceKind; 7] = [
        PieceKind::General,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Horse,
        PieceKind::Chariot,
        PieceKind::Cannon,
        PieceKind::Soldier,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Uppercase letter used by the position notation
    pub const fn letter(self) -> char {
        match self {
            PieceKind::General => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'B',
            PieceKind::Horse => 'N',
            PieceKind::Chariot => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Soldier => 'P',
        }
    }

    /// Parse a piece letter (case-insensitive)
    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'K' => Some(PieceKind::General),
            'A' => Some(PieceKind::Advisor),
            'B' => Some(PieceKind::Elephant),
            'N' => Some(PieceKind::Horse),
            'R' => Some(PieceKind::Chariot),
            'C' => Some(PieceKind::Cannon),
            'P' => Some(PieceKind::Soldier),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::General => "General",
            PieceKind::Advisor => "Advisor",
            PieceKind::Elephant => "Elephant",
            PieceKind::Horse => "Horse",
            PieceKind::Chariot => "Chariot",
            PieceKind::Cannon => "Cannon",
            PieceKind::Soldier => "Soldier",
        }
    }
}

/// A colored piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    #[inline]
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    /// Letter in position notation: uppercase for Red, lowercase for Black
    pub fn to_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::Red => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        Some(Piece { kind, color })
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind.name())
    }
}

/// Square on the 10x9 grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Create square from row and column
    #[inline]
    pub const fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < ROWS && col < COLS);
        Square { row, col }
    }

    /// Checked constructor for signed coordinates
    #[inline]
    pub fn try_new(row: i32, col: i32) -> Option<Self> {
        if (0..ROWS as i32).contains(&row) && (0..COLS as i32).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.col
    }

    /// Linear index (0-89), row-major
    #[inline]
    pub const fn index(self) -> usize {
        self.row as usize * COLS as usize + self.col as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < SQUARE_NB {
            Some(Square {
                row: (index / COLS as usize) as u8,
                col: (index % COLS as usize) as u8,
            })
        } else {
            None
        }
    }

    /// Offset by (dr, dc); `None` when leaving the grid
    #[inline]
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        Square::try_new(self.row as i32 + dr as i32, self.col as i32 + dc as i32)
    }

    /// Mirror vertically (Red's view <-> Black's view)
    ///
    /// Only the row changes, not a 180° rotation: Black reads piece-square
    /// tables on the same column as Red.
    #[inline]
    pub const fn flip(self) -> Self {
        Square {
            row: ROWS - 1 - self.row,
            col: self.col,
        }
    }

    /// Whether the square lies on `color`'s own half of the river
    #[inline]
    pub const fn on_own_side(self, color: Color) -> bool {
        match color {
            Color::Red => self.row >= 5,
            Color::Black => self.row <= 4,
        }
    }

    /// Whether the square lies inside `color`'s palace
    #[inline]
    pub const fn in_palace(self, color: Color) -> bool {
        let col_ok = self.col >= 3 && self.col <= 5;
        match color {
            Color::Red => col_ok && self.row >= 7,
            Color::Black => col_ok && self.row <= 2,
        }
    }

    /// Iterate over all squares in row-major order
    pub fn all() -> impl Iterator<Item = Square> {
        (0..SQUARE_NB).filter_map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A move from one square to another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }

    /// Pack into 16 bits: [13-7] from index, [6-0] to index, bit 15 set
    #[inline]
    pub const fn to_u16(self) -> u16 {
        0x8000 | ((self.from.index() as u16) << 7) | self.to.index() as u16
    }

    #[inline]
    pub const fn from_u16(data: u16) -> Option<Self> {
        if data & 0x8000 == 0 {
            return None;
        }
        let from = match Square::from_index(((data >> 7) & 0x7F) as usize) {
            Some(sq) => sq,
            None => return None,
        };
        let to = match Square::from_index((data & 0x7F) as usize) {
            Some(sq) => sq,
            None => return None,
        };
        Some(Move { from, to })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::Red.opponent(), Color::Black);
        assert_eq!(!Color::Black, Color::Red);
        assert_eq!(Color::Red.forward(), -1);
    }

    #[test]
    fn test_piece_chars() {
        for kind in PieceKind::ALL {
            for color in Color::ALL {
                let piece = Piece::new(kind, color);
                assert_eq!(Piece::from_char(piece.to_char()), Some(piece));
            }
        }
        assert_eq!(Piece::from_char('x'), None);
        assert_eq!(Piece::new(PieceKind::Horse, Color::Black).to_char(), 'n');
    }

    #[test]
    fn test_square_geometry() {
        let sq = Square::new(9, 4);
        assert!(sq.in_palace(Color::Red));
        assert!(!sq.in_palace(Color::Black));
        assert!(sq.on_own_side(Color::Red));
        assert_eq!(sq.flip(), Square::new(0, 4));
        assert_eq!(Square::new(6, 1).flip(), Square::new(3, 1));
        assert_eq!(Square::from_index(sq.index()), Some(sq));
        assert_eq!(sq.offset(1, 0), None);
        assert_eq!(sq.offset(-1, 1), Some(Square::new(8, 5)));
        assert_eq!(Square::all().count(), SQUARE_NB);
    }

    #[test]
    fn test_move_packing() {
        let mv = Move::new(Square::new(9, 1), Square::new(7, 2));
        assert_eq!(Move::from_u16(mv.to_u16()), Some(mv));
        assert_eq!(Move::from_u16(0), None);
    }
}
