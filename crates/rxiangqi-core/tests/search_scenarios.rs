//! End-to-end search scenarios on the reference board

use rxiangqi_core::search::{EvalConfig, MoveSource, SearchConfig, Searcher, depth_for_difficulty};
use rxiangqi_core::{Board, Color, Position, STARTPOS_FEN, decode_move, encode_move, encode_position};
use std::time::Duration;

#[test]
fn startpos_at_difficulty_two_moves_own_piece() {
    let (pos, side) = Position::from_fen(STARTPOS_FEN).unwrap();
    let config = SearchConfig {
        use_book: false,
        ..SearchConfig::with_depth(depth_for_difficulty(2))
    };
    assert_eq!(config.max_depth, 4);

    let mut searcher = Searcher::new(config, EvalConfig::default());
    let result = searcher.search(&pos, side);
    assert_eq!(result.source, MoveSource::Search);
    assert_eq!(result.depth, 4);
    let mv = result.best_move.expect("start position has moves");
    assert!(pos.is_valid_move(mv, side));
    let mover = pos.piece_at(mv.from).expect("piece on origin");
    assert_eq!(mover.color, Color::Red);
    assert!(pos.piece_at(mv.to).is_none_or(|t| t.color != Color::Red));
}

#[test]
fn short_self_play_keeps_moves_legal() {
    let mut pos = Position::startpos();
    let mut side = Color::Red;
    let config = SearchConfig {
        max_depth: 2,
        time_limit: Some(Duration::from_secs(2)),
        ..SearchConfig::default()
    };
    let mut searcher = Searcher::new(config, EvalConfig::default());

    for ply in 0..8 {
        let result = searcher.search(&pos, side);
        let mv = result.best_move.unwrap_or_else(|| panic!("no move at ply {ply}"));
        assert!(pos.is_valid_move(mv, side), "illegal move {mv} at ply {ply}");
        if ply < 2 {
            assert_eq!(result.source, MoveSource::Book);
        }

        // The move survives a trip through the wire format
        let token = encode_move(mv);
        assert_eq!(decode_move(&token, Default::default()).unwrap(), mv);

        pos.apply_move(mv);
        side = side.opponent();
        let (decoded, decoded_side) = Position::from_fen(&encode_position(&pos, side)).unwrap();
        assert_eq!(decoded, pos);
        assert_eq!(decoded_side, side);
    }
}
