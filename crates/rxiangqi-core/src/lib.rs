//! Core of the rxiangqi move-decision engine
//!
//! - [`types`]: colors, pieces, squares, moves
//! - [`board`]: the board contract the decision code is written against
//! - [`position`]: reference board with full movement rules
//! - [`fen`]: position strings and move tokens
//! - [`search`]: iterative-deepening alpha-beta search

pub mod board;
pub mod cancel;
pub mod fen;
pub mod position;
pub mod search;
pub mod types;
pub mod zobrist;

pub use board::{Board, BoardSetup, GameState};
pub use cancel::CancelToken;
pub use fen::{Bounds, CodecError, STARTPOS_FEN, decode_move, encode_move, encode_position};
pub use position::Position;
pub use types::{COLS, Color, Move, Piece, PieceKind, ROWS, Square};
