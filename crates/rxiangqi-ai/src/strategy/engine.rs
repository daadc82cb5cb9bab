//! External engine tier: best move, recovery pass and repetition guard

use super::{DecisionContext, DecisionSource, MoveStrategy, Proposal};
use crate::error::EngineMoveError;
use log::{debug, info, warn};
use rxiangqi_core::{Board, Bounds, Color, Move, decode_move, encode_move, encode_position};
use rxiangqi_uci::EngineClient;
use std::sync::Arc;

/// Basic sanity of a decoded move: a `side` piece on the origin, no capture
/// of an own piece, and the piece's movement rule allows it
pub fn is_sane<B: Board>(board: &B, mv: Move, side: Color) -> bool {
    let Some(piece) = board.piece_at(mv.from) else {
        return false;
    };
    piece.color == side
        && board.piece_at(mv.to).is_none_or(|t| t.color != side)
        && board.is_legal_move(piece, mv.from, mv.to)
}

/// First legal move of `side` whose token equals `token`
pub fn recover_move<B: Board>(board: &B, side: Color, token: &str) -> Option<Move> {
    board.legal_moves(side).into_iter().find(|&mv| encode_move(mv) == token)
}

/// Decode an engine token into a move for `side`. The flag reports whether
/// the recovery pass was needed.
pub fn resolve_token<B: Board>(board: &B, side: Color, token: &str) -> Result<(Move, bool), EngineMoveError> {
    let mv = decode_move(token, Bounds::XIANGQI)?;
    if is_sane(board, mv, side) {
        return Ok((mv, false));
    }
    debug!("engine move {token} failed sanity, trying recovery pass");
    recover_move(board, side, token)
        .map(|mv| (mv, true))
        .ok_or_else(|| EngineMoveError::DecodeMismatch(token.to_string()))
}

/// Asks the external engine for a move
pub struct EngineStrategy {
    client: Arc<dyn EngineClient>,
    candidate_count: usize,
    revalidate_after_clear: bool,
}

impl EngineStrategy {
    pub fn new(client: Arc<dyn EngineClient>) -> Self {
        EngineStrategy {
            client,
            candidate_count: 5,
            revalidate_after_clear: true,
        }
    }

    pub fn with_candidate_count(mut self, count: usize) -> Self {
        self.candidate_count = count;
        self
    }

    pub fn with_revalidation(mut self, revalidate: bool) -> Self {
        self.revalidate_after_clear = revalidate;
        self
    }

    pub fn client(&self) -> &Arc<dyn EngineClient> {
        &self.client
    }

    /// Full engine pass for `ctx.side`
    pub fn engine_move<B: Board>(&self, board: &B, ctx: &DecisionContext<'_>) -> Result<Proposal, EngineMoveError> {
        if !self.client.is_available() {
            return Err(EngineMoveError::Unavailable);
        }
        let position = encode_position(board, ctx.side);
        let token = self
            .client
            .request_best_move(&position, ctx.think_time, ctx.cancel)
            .map(|t| t.trim().to_string())
            .ok_or(EngineMoveError::NoMove)?;

        let (mv, recovered) = resolve_token(board, ctx.side, &token)?;
        let source = if recovered {
            DecisionSource::EngineRecovered
        } else {
            DecisionSource::Engine
        };
        if !ctx.history.is_repetitive(&token) {
            return Ok(Proposal {
                mv,
                token,
                source,
                clear_history: false,
            });
        }

        info!("engine move {token} is repetitive, asking for alternatives");
        if let Some(proposal) = self.substitute(board, ctx, &position, &token) {
            return Ok(proposal);
        }

        // Nothing better: keep the move but forget the cycle
        if self.revalidate_after_clear && !board.is_valid_move(mv, ctx.side) {
            warn!("repetitive move {token} is not safe, rejecting");
            return Err(EngineMoveError::Repetitive(token));
        }
        info!("no alternative to {token}, clearing move history");
        Ok(Proposal {
            mv,
            token,
            source: DecisionSource::EngineRepeated,
            clear_history: true,
        })
    }

    /// First candidate that is not repetitive and decodes to a usable move
    fn substitute<B: Board>(
        &self,
        board: &B,
        ctx: &DecisionContext<'_>,
        position: &str,
        rejected: &str,
    ) -> Option<Proposal> {
        if self.candidate_count == 0 || ctx.cancel.is_cancelled() {
            return None;
        }
        let candidates =
            self.client
                .request_candidate_moves(position, ctx.candidate_think_time, self.candidate_count, ctx.cancel);
        debug!("engine candidates: {candidates:?}");
        for candidate in candidates {
            let candidate = candidate.trim();
            if candidate == rejected || ctx.history.is_repetitive(candidate) {
                continue;
            }
            match resolve_token(board, ctx.side, candidate) {
                Ok((mv, _)) => {
                    info!("substituting engine candidate {candidate}");
                    return Some(Proposal {
                        mv,
                        token: candidate.to_string(),
                        source: DecisionSource::EngineCandidate,
                        clear_history: false,
                    });
                }
                Err(e) => debug!("candidate {candidate} rejected: {e}"),
            }
        }
        None
    }
}

impl<B: Board> MoveStrategy<B> for EngineStrategy {
    fn name(&self) -> &'static str {
        "engine"
    }

    fn try_move(&self, board: &B, ctx: &DecisionContext<'_>) -> Option<Proposal> {
        match self.engine_move(board, ctx) {
            Ok(proposal) => Some(proposal),
            Err(e) => {
                debug!("engine tier declined: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MoveHistory;
    use crate::strategy::test_support::{ScriptedEngine, context};
    use rxiangqi_core::{CancelToken, Piece, PieceKind, Position, Square};
    use std::sync::atomic::Ordering;

    fn strategy(engine: &Arc<ScriptedEngine>) -> EngineStrategy {
        EngineStrategy::new(engine.clone())
    }

    fn history(tokens: &[&str]) -> MoveHistory {
        let mut h = MoveHistory::default();
        for t in tokens {
            h.push(*t);
        }
        h
    }

    /// Board whose movement rule rejects every horse move even though the
    /// move generator still produces them
    #[derive(Clone)]
    struct StrictHorseBoard(Position);

    impl Board for StrictHorseBoard {
        fn piece_at(&self, sq: Square) -> Option<Piece> {
            self.0.piece_at(sq)
        }
        fn is_legal_move(&self, piece: Piece, from: Square, to: Square) -> bool {
            piece.kind != PieceKind::Horse && self.0.is_legal_move(piece, from, to)
        }
        fn is_move_safe(&self, from: Square, to: Square, color: Color) -> bool {
            self.0.is_move_safe(from, to, color)
        }
        fn apply_move(&mut self, mv: Move) {
            self.0.apply_move(mv)
        }
        fn in_check(&self, color: Color) -> bool {
            self.0.in_check(color)
        }
        fn targets(&self, from: Square) -> Vec<Square> {
            self.0.targets(from)
        }
    }

    #[test]
    fn test_accepts_engine_move() {
        let engine = Arc::new(ScriptedEngine::with_best(&["h2e2"]));
        let (h, cancel) = (MoveHistory::default(), CancelToken::new());
        let p = strategy(&engine)
            .engine_move(&Position::startpos(), &context(Color::Red, &h, &cancel))
            .unwrap();
        assert_eq!(p.token, "h2e2");
        assert_eq!(p.source, DecisionSource::Engine);
        assert!(!p.clear_history);
    }

    #[test]
    fn test_error_kinds() {
        let pos = Position::startpos();
        let (h, cancel) = (MoveHistory::default(), CancelToken::new());
        let ctx = context(Color::Red, &h, &cancel);

        let engine = Arc::new(ScriptedEngine::default());
        engine.unavailable.store(true, Ordering::SeqCst);
        assert_eq!(strategy(&engine).engine_move(&pos, &ctx), Err(EngineMoveError::Unavailable));

        let engine = Arc::new(ScriptedEngine::default());
        assert_eq!(strategy(&engine).engine_move(&pos, &ctx), Err(EngineMoveError::NoMove));

        let engine = Arc::new(ScriptedEngine::with_best(&["zz99"]));
        assert!(matches!(strategy(&engine).engine_move(&pos, &ctx), Err(EngineMoveError::Codec(_))));

        // Black piece for red to move
        let engine = Arc::new(ScriptedEngine::with_best(&["h7e7"]));
        assert_eq!(
            strategy(&engine).engine_move(&pos, &ctx),
            Err(EngineMoveError::DecodeMismatch("h7e7".into()))
        );
    }

    #[test]
    fn test_recovery_pass_matches_token() {
        let board = StrictHorseBoard(Position::startpos());
        let mv = decode_move("b0c2", Bounds::XIANGQI).unwrap();
        assert!(!is_sane(&board, mv, Color::Red));
        assert_eq!(resolve_token(&board, Color::Red, "b0c2"), Ok((mv, true)));

        let engine = Arc::new(ScriptedEngine::with_best(&["b0c2"]));
        let (h, cancel) = (MoveHistory::default(), CancelToken::new());
        let p = strategy(&engine)
            .engine_move(&board, &context(Color::Red, &h, &cancel))
            .unwrap();
        assert_eq!(p.mv, mv);
        assert_eq!(p.source, DecisionSource::EngineRecovered);
    }

    #[test]
    fn test_repetition_substitutes_candidate() {
        let engine = Arc::new(ScriptedEngine::with_best(&["h2e2"]));
        // Repetitive, same as rejected, unusable, then good
        engine.set_candidates(&["b2e2", "h2e2", "a0a5", "b0c2", "c3c4"]);
        let h = history(&["b2e2", "h2e2", "b2e2"]);
        let cancel = CancelToken::new();
        let p = strategy(&engine)
            .engine_move(&Position::startpos(), &context(Color::Red, &h, &cancel))
            .unwrap();
        assert_eq!(p.token, "b0c2");
        assert_eq!(p.source, DecisionSource::EngineCandidate);
        assert!(!p.clear_history);
        assert_eq!(engine.candidate_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exhausted_candidates_clear_history() {
        let engine = Arc::new(ScriptedEngine::with_best(&["h2e2"]));
        engine.set_candidates(&["h2e2"]);
        let h = history(&["b2e2", "h2e2", "b2e2"]);
        let cancel = CancelToken::new();
        let p = strategy(&engine)
            .engine_move(&Position::startpos(), &context(Color::Red, &h, &cancel))
            .unwrap();
        assert_eq!(p.token, "h2e2");
        assert_eq!(p.source, DecisionSource::EngineRepeated);
        assert!(p.clear_history);
    }

    #[test]
    fn test_unsafe_repeated_move_is_rejected_after_clear() {
        // Red chariot pinned on the file: moving it sideways exposes the general
        let pos = Position::from_pieces(vec![
            (Square::new(9, 4), Piece::new(PieceKind::General, Color::Red)),
            (Square::new(6, 4), Piece::new(PieceKind::Chariot, Color::Red)),
            (Square::new(0, 4), Piece::new(PieceKind::Chariot, Color::Black)),
            (Square::new(0, 3), Piece::new(PieceKind::General, Color::Black)),
        ]);
        let unsafe_token = "e3a3";
        let mv = decode_move(unsafe_token, Bounds::XIANGQI).unwrap();
        assert!(is_sane(&pos, mv, Color::Red));
        assert!(!pos.is_valid_move(mv, Color::Red));

        let engine = Arc::new(ScriptedEngine::with_best(&[unsafe_token]));
        let h = history(&[unsafe_token, "e6e5", unsafe_token]);
        let cancel = CancelToken::new();
        let ctx = context(Color::Red, &h, &cancel);
        assert_eq!(
            strategy(&engine).engine_move(&pos, &ctx),
            Err(EngineMoveError::Repetitive(unsafe_token.into()))
        );

        // Without re-validation the move is passed through
        let engine = Arc::new(ScriptedEngine::with_best(&[unsafe_token]));
        let p = strategy(&engine)
            .with_revalidation(false)
            .engine_move(&pos, &ctx)
            .unwrap();
        assert!(p.clear_history);
    }
}
