//! Zobrist hashing for transposition table keys

use crate::board::Board;
use crate::types::{Color, PieceKind, SQUARE_NB};
use rand::RngCore;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::LazyLock;

/// Fixed seed so hashes are reproducible across runs
const ZOBRIST_SEED: u64 = 0x5851_F42D_4C95_7F2D;

pub struct ZobristKeys {
    pieces: [[[u64; SQUARE_NB]; PieceKind::NUM]; Color::NUM],
    side: u64,
}

impl ZobristKeys {
    fn generate() -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);
        let mut pieces = [[[0u64; SQUARE_NB]; PieceKind::NUM]; Color::NUM];
        for color in pieces.iter_mut() {
            for kind in color.iter_mut() {
                for key in kind.iter_mut() {
                    *key = rng.next_u64();
                }
            }
        }
        ZobristKeys {
            pieces,
            side: rng.next_u64(),
        }
    }
}

pub static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::generate);

/// Hash of a board with `side_to_move` to move
pub fn hash_board<B: Board>(board: &B, side_to_move: Color) -> u64 {
    let keys = &*ZOBRIST;
    let mut hash = 0u64;
    for (sq, piece) in board.pieces() {
        hash ^= keys.pieces[piece.color.index()][piece.kind.index()][sq.index()];
    }
    if side_to_move == Color::Black {
        hash ^= keys.side;
    }
    hash
}
