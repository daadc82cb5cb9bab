//! Short English explanation of a chosen move
//!
//! Built from evaluation terms before and after the move. Purely
//! informational: it is computed after the move is fixed and never feeds back
//! into selection.

use rxiangqi_core::search::{EvalBreakdown, Evaluator};
use rxiangqi_core::{Board, Color, GameState, Move, Piece, PieceKind, encode_move};
use std::fmt;

/// Evaluation delta below which a term is not worth mentioning
const NOTABLE_DELTA: i32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rationale {
    pub side: Color,
    pub description: String,
    pub captured: Option<Piece>,
    pub gives_check: bool,
    pub checkmate: bool,
    pub before: EvalBreakdown,
    pub after: EvalBreakdown,
}

impl Rationale {
    /// `None` when there is no piece on the origin square
    pub fn build<B: Board>(evaluator: &Evaluator, board: &B, mv: Move, side: Color) -> Option<Self> {
        let description = describe_move(board, mv)?;
        let captured = board.piece_at(mv.to);
        let before = evaluator.breakdown(board, side);

        let mut next = board.clone();
        next.apply_move(mv);
        let after = evaluator.breakdown(&next, side);
        let opponent = side.opponent();
        let gives_check = next.in_check(opponent);
        let checkmate = gives_check && next.game_state(opponent) == GameState::Checkmate;

        Some(Rationale {
            side,
            description,
            captured,
            gives_check,
            checkmate,
            before,
            after,
        })
    }

    pub fn material_swing(&self) -> i32 {
        self.after.material - self.before.material
    }

    pub fn score_change(&self) -> i32 {
        self.after.total() - self.before.total()
    }

    /// Clauses describing what the move achieves, most important first
    pub fn reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.checkmate {
            reasons.push("delivers checkmate".to_string());
        } else if self.gives_check {
            reasons.push("gives check".to_string());
        }
        match self.captured {
            Some(p) if p.kind == PieceKind::General => reasons.push("captures the general".to_string()),
            Some(p) => reasons.push(format!(
                "captures the {} {}",
                p.color.name().to_lowercase(),
                p.kind.name().to_lowercase()
            )),
            None => {}
        }

        let deltas = [
            (self.after.positional - self.before.positional, "improves piece placement"),
            (self.after.mobility - self.before.mobility, "increases mobility"),
            (self.after.control - self.before.control, "strengthens central control"),
            (self.after.safety - self.before.safety, "shores up the defence"),
            (self.after.tactics - self.before.tactics, "creates tactical pressure"),
        ];
        if let Some((_, text)) = deltas
            .iter()
            .filter(|(d, _)| *d >= NOTABLE_DELTA)
            .max_by_key(|(d, _)| *d)
        {
            reasons.push(text.to_string());
        }

        if reasons.is_empty() {
            reasons.push("keeps the position steady".to_string());
        }
        reasons
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {}; evaluation {} -> {}",
            self.description,
            self.reasons().join(", "),
            self.before.total(),
            self.after.total()
        )
    }
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// "Red Horse b0-c2", with `x` for captures; `None` for an empty origin
pub fn describe_move<B: Board>(board: &B, mv: Move) -> Option<String> {
    let mover = board.piece_at(mv.from)?;
    let token = encode_move(mv);
    let sep = if board.piece_at(mv.to).is_some() { 'x' } else { '-' };
    Some(format!(
        "{} {} {}{}{}",
        mover.color,
        mover.kind.name(),
        &token[..2],
        sep,
        &token[2..]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxiangqi_core::{Position, Square, decode_move};

    fn mv(token: &str) -> Move {
        decode_move(token, Default::default()).unwrap()
    }

    fn p(kind: PieceKind, color: Color, row: u8, col: u8) -> (Square, Piece) {
        (Square::new(row, col), Piece::new(kind, color))
    }

    #[test]
    fn test_quiet_opening_move() {
        let pos = Position::startpos();
        let r = Rationale::build(&Evaluator::default(), &pos, mv("h2e2"), Color::Red).unwrap();
        assert_eq!(r.description, "Red Cannon h2-e2");
        assert_eq!(r.captured, None);
        assert!(!r.gives_check);
        assert_eq!(r.material_swing(), 0);
        assert!(r.summary().starts_with("Red Cannon h2-e2: "));
    }

    #[test]
    fn test_capture_and_mate_are_reported() {
        let pos = Position::from_pieces(vec![
            p(PieceKind::General, Color::Black, 0, 4),
            p(PieceKind::General, Color::Red, 9, 3),
            p(PieceKind::Chariot, Color::Red, 1, 0),
            p(PieceKind::Chariot, Color::Red, 5, 8),
            p(PieceKind::Horse, Color::Black, 0, 8),
        ]);
        let r = Rationale::build(&Evaluator::default(), &pos, mv("i4i9"), Color::Red).unwrap();
        assert_eq!(r.description, "Red Chariot i4xi9");
        assert_eq!(r.captured, Some(Piece::new(PieceKind::Horse, Color::Black)));
        assert!(r.gives_check);
        assert!(r.checkmate);
        assert!(r.material_swing() > 0);
        let reasons = r.reasons();
        assert_eq!(reasons[0], "delivers checkmate");
        assert_eq!(reasons[1], "captures the black horse");
    }

    #[test]
    fn test_empty_origin_has_no_rationale() {
        let pos = Position::startpos();
        assert!(Rationale::build(&Evaluator::default(), &pos, mv("e5e4"), Color::Red).is_none());
        assert!(describe_move(&pos, mv("e5e4")).is_none());
    }
}
