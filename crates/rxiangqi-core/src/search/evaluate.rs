//! Static evaluation
//!
//! Score is always from the point of view of the color passed in; positive
//! favours that side.

use super::config::EvalConfig;
use crate::board::Board;
use crate::types::{COLS, Color, Piece, PieceKind, SQUARE_NB, Square};
use smallvec::SmallVec;

/// Cells counted for centre control
const CENTER_ROWS: [u8; 2] = [4, 5];
const CENTER_COLS: [u8; 3] = [3, 4, 5];
/// River banks
const RIVER_ROWS: [u8; 2] = [4, 5];

/// Individual evaluation terms, each already weighted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalBreakdown {
    pub material: i32,
    pub positional: i32,
    pub mobility: i32,
    pub safety: i32,
    pub control: i32,
    pub check: i32,
    pub tactics: i32,
}

impl EvalBreakdown {
    pub fn total(&self) -> i32 {
        self.material
            + self.positional
            + self.mobility
            + self.safety
            + self.control
            + self.check
            + self.tactics
    }
}

/// Per-color attack counts for every cell
struct AttackMap {
    counts: [[u8; SQUARE_NB]; Color::NUM],
    mobility: [i32; Color::NUM],
    /// Enemy pieces attacked by each piece (indexed by square)
    victims: [u8; SQUARE_NB],
}

impl AttackMap {
    fn build<B: Board>(board: &B, pieces: &[(Square, Piece)]) -> Self {
        let mut map = AttackMap {
            counts: [[0; SQUARE_NB]; Color::NUM],
            mobility: [0; Color::NUM],
            victims: [0; SQUARE_NB],
        };
        for &(from, piece) in pieces {
            let c = piece.color.index();
            let targets = board.targets(from);
            map.mobility[c] += targets.len() as i32;
            for to in targets {
                map.counts[c][to.index()] += 1;
                if board.piece_at(to).is_some_and(|t| t.color != piece.color) {
                    map.victims[from.index()] += 1;
                }
            }
            // Defended own pieces are not in `targets`
            for &(sq, other) in pieces {
                if other.color == piece.color && sq != from && board.attacks(from, sq) {
                    map.counts[c][sq.index()] += 1;
                }
            }
        }
        map
    }

    #[inline]
    fn count(&self, color: Color, sq: Square) -> i32 {
        self.counts[color.index()][sq.index()] as i32
    }
}

#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Evaluator { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Total score for `color`
    pub fn evaluate<B: Board>(&self, board: &B, color: Color) -> i32 {
        self.breakdown(board, color).total()
    }

    /// Evaluation split into its terms
    pub fn breakdown<B: Board>(&self, board: &B, color: Color) -> EvalBreakdown {
        let cfg = &self.config;
        let pieces = board.pieces();
        let sign = |c: Color| if c == color { 1 } else { -1 };

        let mut out = EvalBreakdown::default();
        for &(sq, piece) in &pieces {
            out.material += sign(piece.color) * cfg.value(piece.kind);
            out.positional += sign(piece.color) * self.position_value(piece, sq);
        }

        let needs_attacks = cfg.mobility_weight != 0
            || cfg.safety_weight != 0
            || cfg.control_weight != 0
            || cfg.tactical_weight != 0;
        if !needs_attacks {
            return out;
        }

        let map = AttackMap::build(board, &pieces);
        let opp = color.opponent();

        out.mobility = (map.mobility[color.index()] - map.mobility[opp.index()]) * cfg.mobility_weight;

        let mut safety = 0;
        for &(sq, piece) in &pieces {
            let defenders = map.count(piece.color, sq);
            let attackers = map.count(piece.color.opponent(), sq);
            safety += sign(piece.color) * (defenders - attackers);
        }
        out.safety = safety * cfg.safety_weight;

        let mut control = 0;
        for row in CENTER_ROWS {
            for col in CENTER_COLS {
                let sq = Square::new(row, col);
                control += (map.count(color, sq) - map.count(opp, sq)) * 5;
            }
        }
        for row in RIVER_ROWS {
            for col in 0..COLS {
                let sq = Square::new(row, col);
                control += (map.count(color, sq) - map.count(opp, sq)) * 3;
            }
        }
        out.control = control * cfg.control_weight;

        if cfg.tactical_weight != 0 {
            let mut check = 0;
            if board.in_check(opp) {
                check += cfg.check_bonus;
            }
            if board.in_check(color) {
                check -= cfg.check_bonus;
            }
            out.check = check * cfg.tactical_weight;

            let mut tactics = 0;
            for side in Color::ALL {
                let forks = pieces
                    .iter()
                    .filter(|(sq, p)| p.color == side && map.victims[sq.index()] >= 2)
                    .count() as i32;
                let (pins, discovered) = line_tactics(board, side);
                let units =
                    forks * cfg.fork_bonus + pins * cfg.pin_bonus + discovered * cfg.discovered_bonus;
                tactics += sign(side) * units;
            }
            out.tactics = tactics * cfg.tactical_weight;
        }

        out
    }

    fn position_value(&self, piece: Piece, sq: Square) -> i32 {
        let table = match piece.kind {
            PieceKind::Soldier => &self.config.soldier_table,
            PieceKind::Horse => &self.config.horse_table,
            _ => return 0,
        };
        let sq = match piece.color {
            Color::Red => sq,
            Color::Black => sq.flip(),
        };
        table[sq.row() as usize][sq.col() as usize]
    }
}

/// Pins and discovered-attack chances created by `side`'s line pieces
/// against the enemy general.
///
/// - pin: a chariot with exactly one enemy piece between it and the general
/// - discovered: a chariot with exactly one own piece in between, or a
///   cannon with two pieces in between, at least one of them own
fn line_tactics<B: Board>(board: &B, side: Color) -> (i32, i32) {
    let Some(general) = board
        .pieces()
        .into_iter()
        .find(|(_, p)| p.kind == PieceKind::General && p.color != side)
        .map(|(sq, _)| sq)
    else {
        return (0, 0);
    };

    let mut pins = 0;
    let mut discovered = 0;
    for (sq, piece) in board.pieces() {
        if piece.color != side || !matches!(piece.kind, PieceKind::Chariot | PieceKind::Cannon) {
            continue;
        }
        let Some(between) = pieces_between(board, sq, general) else {
            continue;
        };
        match (piece.kind, between.as_slice()) {
            (PieceKind::Chariot, [blocker]) if blocker.color != side => pins += 1,
            (PieceKind::Chariot, [_]) => discovered += 1,
            (PieceKind::Cannon, [a, b]) if a.color == side || b.color == side => discovered += 1,
            _ => {}
        }
    }
    (pins, discovered)
}

/// Pieces strictly between two squares on a shared row or column
fn pieces_between<B: Board>(board: &B, a: Square, b: Square) -> Option<SmallVec<[Piece; 4]>> {
    let (dr, dc) = if a.row() == b.row() {
        (0, if b.col() > a.col() { 1 } else { -1 })
    } else if a.col() == b.col() {
        (if b.row() > a.row() { 1 } else { -1 }, 0)
    } else {
        return None;
    };
    let mut out = SmallVec::new();
    let mut cur = a.offset(dr, dc);
    while let Some(sq) = cur {
        if sq == b {
            return Some(out);
        }
        if let Some(p) = board.piece_at(sq) {
            out.push(p);
        }
        cur = sq.offset(dr, dc);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::types::{Move, Piece};

    fn general(color: Color, row: u8, col: u8) -> (Square, Piece) {
        (Square::new(row, col), Piece::new(PieceKind::General, color))
    }

    #[test]
    fn test_startpos_is_balanced() {
        let eval = Evaluator::default();
        let pos = Position::startpos();
        assert_eq!(eval.evaluate(&pos, Color::Red), 0);
        assert_eq!(eval.evaluate(&pos, Color::Black), 0);
    }

    #[test]
    fn test_evaluation_is_antisymmetric() {
        let eval = Evaluator::default();
        let mut pos = Position::startpos();
        pos.apply_move(Move::new(Square::new(7, 7), Square::new(7, 4)));
        pos.apply_move(Move::new(Square::new(0, 7), Square::new(2, 6)));
        let red = eval.evaluate(&pos, Color::Red);
        assert_eq!(red, -eval.evaluate(&pos, Color::Black));
    }

    #[test]
    fn test_material_advantage_counts() {
        let eval = Evaluator::new(EvalConfig::material_only());
        let pos = Position::from_pieces(vec![
            general(Color::Red, 9, 4),
            general(Color::Black, 0, 3),
            (Square::new(5, 0), Piece::new(PieceKind::Chariot, Color::Red)),
        ]);
        assert_eq!(eval.evaluate(&pos, Color::Red), 900);
    }

    #[test]
    fn test_soldier_table_mirrors_for_black() {
        let eval = Evaluator::new(EvalConfig::material_only());
        let red = Position::from_pieces(vec![
            general(Color::Red, 9, 4),
            general(Color::Black, 0, 3),
            (Square::new(3, 4), Piece::new(PieceKind::Soldier, Color::Red)),
        ]);
        let black = Position::from_pieces(vec![
            general(Color::Red, 9, 4),
            general(Color::Black, 0, 3),
            (Square::new(6, 4), Piece::new(PieceKind::Soldier, Color::Black)),
        ]);
        assert_eq!(eval.evaluate(&red, Color::Red), eval.evaluate(&black, Color::Black));
        assert!(eval.evaluate(&red, Color::Red) > 100);
    }

    #[test]
    fn test_black_reads_tables_on_the_same_column() {
        let mut cfg = EvalConfig::material_only();
        cfg.soldier_table = [[0; 9]; 10];
        cfg.soldier_table[3][1] = 77;
        let eval = Evaluator::new(cfg);
        let kings = || vec![general(Color::Red, 9, 4), general(Color::Black, 0, 3)];
        let with = |sq: Square, color: Color| {
            let mut pieces = kings();
            pieces.push((sq, Piece::new(PieceKind::Soldier, color)));
            Position::from_pieces(pieces)
        };
        let base = eval.evaluate(&with(Square::new(3, 1), Color::Red), Color::Red);
        assert_eq!(base, eval.evaluate(&with(Square::new(6, 1), Color::Black), Color::Black));
        // A rotated lookup would land on column 7
        assert_ne!(base, eval.evaluate(&with(Square::new(6, 7), Color::Black), Color::Black));
    }

    #[test]
    fn test_check_and_pin_terms() {
        let eval = Evaluator::default();
        // Red chariot pins a black horse against the black general
        let pos = Position::from_pieces(vec![
            general(Color::Red, 9, 3),
            general(Color::Black, 0, 4),
            (Square::new(2, 4), Piece::new(PieceKind::Horse, Color::Black)),
            (Square::new(6, 4), Piece::new(PieceKind::Chariot, Color::Red)),
        ]);
        let terms = eval.breakdown(&pos, Color::Red);
        assert_eq!(terms.check, 0);
        assert_eq!(terms.tactics, 30);

        // Remove the horse: now it is check
        let pos = Position::from_pieces(vec![
            general(Color::Red, 9, 3),
            general(Color::Black, 0, 4),
            (Square::new(6, 4), Piece::new(PieceKind::Chariot, Color::Red)),
        ]);
        assert_eq!(eval.breakdown(&pos, Color::Red).check, 100);
    }
}
