//! Position codec: FEN-like position strings and 4-character move tokens
//!
//! Position string layout:
//! `<row0>/<row1>/.../<row9> <side> - - 0 1`
//! - rows run from Black's back rank (row 0) to Red's back rank (row 9)
//! - digits encode runs of empty cells, letters `k a b n r c p` encode pieces,
//!   uppercase for Red and lowercase for Black
//! - side is `w` for Red and `b` for Black
//!
//! Move token layout: file letter + rank digit, twice (e.g. `h2e2`). File `a`
//! is column 0; rank digit `r` corresponds to row `ROWS - 1 - r`.

use crate::board::{Board, BoardSetup};
use crate::types::{COLS, Color, Move, Piece, ROWS, Square};
use thiserror::Error;

/// Initial position
pub const STARTPOS_FEN: &str =
    "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

/// Fixed trailer after the side-to-move field
const FEN_SUFFIX: &str = "- - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed move token '{0}'")]
    MalformedToken(String),
    #[error("move token '{0}' is outside the board")]
    OutOfBounds(String),
    #[error("invalid position string: {0}")]
    InvalidPosition(String),
}

/// Grid dimensions a decoded token must fit in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub rows: u8,
    pub cols: u8,
}

impl Bounds {
    pub const XIANGQI: Bounds = Bounds {
        rows: ROWS,
        cols: COLS,
    };
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::XIANGQI
    }
}

/// Side-to-move character
pub fn side_char(color: Color) -> char {
    match color {
        Color::Red => 'w',
        Color::Black => 'b',
    }
}

/// Placement field only (rows joined by '/')
pub fn encode_placement<B: Board>(board: &B) -> String {
    let mut out = String::with_capacity(64);
    for row in 0..ROWS {
        if row > 0 {
            out.push('/');
        }
        let mut empty = 0u8;
        for col in 0..COLS {
            match board.piece_at(Square::new(row, col)) {
                Some(piece) => {
                    if empty > 0 {
                        out.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push((b'0' + empty) as char);
        }
    }
    out
}

/// Encode a board and side to move into a position string. Never fails.
pub fn encode_position<B: Board>(board: &B, side_to_move: Color) -> String {
    format!("{} {} {}", encode_placement(board), side_char(side_to_move), FEN_SUFFIX)
}

/// Decoded position string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedPosition {
    pub pieces: Vec<(Square, Piece)>,
    pub side_to_move: Color,
}

/// Parse a position string into its placement and side to move
pub fn parse_position(s: &str) -> Result<ParsedPosition, CodecError> {
    let invalid = |msg: String| CodecError::InvalidPosition(msg);
    let mut fields = s.split_whitespace();
    let placement = fields.next().ok_or_else(|| invalid("empty string".to_string()))?;
    let side_to_move = match fields.next() {
        Some("w") | Some("r") | None => Color::Red,
        Some("b") => Color::Black,
        Some(other) => return Err(invalid(format!("unknown side '{other}'"))),
    };

    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != ROWS as usize {
        return Err(invalid(format!("expected {ROWS} rows, found {}", rows.len())));
    }

    let mut pieces = Vec::with_capacity(32);
    for (row, text) in rows.iter().enumerate() {
        let mut col = 0usize;
        for c in text.chars() {
            if let Some(d) = c.to_digit(10) {
                if d == 0 {
                    return Err(invalid(format!("zero run in row {row}")));
                }
                col += d as usize;
            } else {
                let piece = Piece::from_char(c)
                    .ok_or_else(|| invalid(format!("unknown piece '{c}' in row {row}")))?;
                if col >= COLS as usize {
                    return Err(invalid(format!("row {row} is wider than {COLS}")));
                }
                pieces.push((Square::new(row as u8, col as u8), piece));
                col += 1;
            }
        }
        if col != COLS as usize {
            return Err(invalid(format!("row {row} has width {col}, expected {COLS}")));
        }
    }

    Ok(ParsedPosition {
        pieces,
        side_to_move,
    })
}

/// Materialise a position string into any board that supports setup
pub fn decode_position<B: BoardSetup>(s: &str) -> Result<(B, Color), CodecError> {
    let parsed = parse_position(s)?;
    let mut board = B::empty();
    for (sq, piece) in parsed.pieces {
        board.set_piece(sq, Some(piece));
    }
    Ok((board, parsed.side_to_move))
}

#[inline]
fn square_token(sq: Square) -> [char; 2] {
    [(b'a' + sq.col()) as char, (b'0' + (ROWS - 1 - sq.row())) as char]
}

/// Encode a move as a 4-character token. Total for on-board squares.
pub fn encode_move(mv: Move) -> String {
    let [f1, r1] = square_token(mv.from);
    let [f2, r2] = square_token(mv.to);
    [f1, r1, f2, r2].iter().collect()
}

#[inline]
fn is_file_char(b: u8) -> bool {
    (b'a'..b'a' + COLS).contains(&b)
}

/// Decode a 4-character token into a move on a grid of the given bounds
///
/// Files outside `a`..`i` or non-digit ranks are `MalformedToken`; cells in
/// the alphabet but beyond `bounds` are `OutOfBounds`.
pub fn decode_move(token: &str, bounds: Bounds) -> Result<Move, CodecError> {
    let bytes = token.as_bytes();
    let well_formed = bytes.len() == 4
        && is_file_char(bytes[0])
        && bytes[1].is_ascii_digit()
        && is_file_char(bytes[2])
        && bytes[3].is_ascii_digit();
    if !well_formed {
        return Err(CodecError::MalformedToken(token.to_string()));
    }

    let square = |file: u8, rank: u8| -> Result<Square, CodecError> {
        let col = file - b'a';
        let rank = rank - b'0';
        if col >= bounds.cols || rank >= bounds.rows {
            return Err(CodecError::OutOfBounds(token.to_string()));
        }
        let row = bounds.rows - 1 - rank;
        Square::try_new(row as i32, col as i32)
            .ok_or_else(|| CodecError::OutOfBounds(token.to_string()))
    };

    Ok(Move::new(square(bytes[0], bytes[1])?, square(bytes[2], bytes[3])?))
}
