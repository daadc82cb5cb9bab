//! Iterative-deepening alpha-beta searcher
//!
//! Scores are kept from the searching side's point of view throughout: nodes
//! where that side moves maximize, the others minimize. The transposition
//! table instead holds scores relative to the side to move, with mates stored
//! by distance from the node, so one table serves both colors and any
//! remaining depth.

use super::book::OpeningBook;
use super::config::{EvalConfig, SearchConfig};
use super::evaluate::Evaluator;
use super::ordering::order_moves;
use super::tt::{NodeType, TranspositionTable};
use super::{INFINITE, MATE_SCORE};
use crate::board::Board;
use crate::types::{Color, Move};
use crate::zobrist::hash_board;
use log::{debug, trace};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Time is checked once every this many nodes
const TIME_CHECK_INTERVAL: u64 = 256;

/// Any score at least this large in magnitude is a mate score
const MATE_BOUND: i32 = MATE_SCORE - u8::MAX as i32;

/// Progress report after each completed iteration
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: u8,
    pub score: i32,
    pub best_move: Option<Move>,
    pub nodes: u64,
    pub elapsed: Duration,
}

pub type InfoCallback = Arc<dyn Fn(&SearchInfo) + Send + Sync>;

/// Runtime limits for one search
#[derive(Clone, Default)]
pub struct SearchLimits {
    /// Maximum search time (overrides `SearchConfig::time_limit`)
    pub time: Option<Duration>,
    /// Maximum nodes to search
    pub nodes: Option<u64>,
    /// Stop flag for interrupting search
    pub stop_flag: Option<Arc<AtomicBool>>,
    /// Info callback for search progress
    pub info_callback: Option<InfoCallback>,
}

impl std::fmt::Debug for SearchLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchLimits")
            .field("time", &self.time)
            .field("nodes", &self.nodes)
            .field("stop_flag", &self.stop_flag.as_ref().map(|arc| arc.as_ptr()))
            .field("info_callback", &self.info_callback.is_some())
            .finish()
    }
}

/// Where the chosen move came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveSource {
    Book,
    Search,
    /// No iteration completed; first ordered legal move
    Fallback,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    /// Deepest fully completed iteration (0 for book/fallback)
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub source: MoveSource,
}

pub struct Searcher {
    config: SearchConfig,
    evaluator: Evaluator,
    tt: Arc<TranspositionTable>,
    book: OpeningBook,
    limits: SearchLimits,
    // Per-search state
    ai_color: Color,
    start_time: Instant,
    nodes: u64,
    stopped: bool,
}

impl Searcher {
    pub fn new(config: SearchConfig, eval: EvalConfig) -> Self {
        let tt = Arc::new(TranspositionTable::new(config.tt_entries));
        let book = OpeningBook::default().with_min_pieces(config.opening_threshold);
        Searcher {
            config,
            evaluator: Evaluator::new(eval),
            tt,
            book,
            limits: SearchLimits::default(),
            ai_color: Color::Red,
            start_time: Instant::now(),
            nodes: 0,
            stopped: false,
        }
    }

    /// Share an existing table between searchers
    pub fn with_tt(mut self, tt: Arc<TranspositionTable>) -> Self {
        self.tt = tt;
        self
    }

    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = book;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_limits(&mut self, limits: SearchLimits) {
        self.limits = limits;
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// Best move for `side`, or `None` when `side` has no legal move
    pub fn best_move<B: Board>(&mut self, board: &B, side: Color) -> Option<Move> {
        self.search(board, side).best_move
    }

    /// Full search: opening book, then iterative deepening
    pub fn search<B: Board>(&mut self, board: &B, side: Color) -> SearchResult {
        self.ai_color = side;
        self.start_time = Instant::now();
        self.nodes = 0;
        self.stopped = false;

        if self.config.use_book {
            if let Some(mv) = self.book.lookup(board, side) {
                debug!("opening book move {mv}");
                return self.result(Some(mv), 0, 0, MoveSource::Book);
            }
        }

        let mut root_moves = board.legal_moves(side);
        if root_moves.is_empty() {
            let score = if board.in_check(side) { -MATE_SCORE } else { -MATE_SCORE + 1 };
            return self.result(None, score, 0, MoveSource::Search);
        }

        if self.config.use_tt {
            self.tt.new_search();
        }
        let hash_move = self.probe_move(board, side);
        order_moves(board, &mut root_moves, hash_move, self.evaluator.config());

        let mut best: Option<(Move, i32)> = None;
        let mut completed = 0u8;
        for depth in 1..=self.config.max_depth.max(1) {
            let Some((score, mv)) = self.search_root(board, side, &mut root_moves, depth) else {
                debug!("depth {depth} interrupted after {} nodes", self.nodes);
                break;
            };
            best = Some((mv, score));
            completed = depth;
            if let Some(cb) = &self.limits.info_callback {
                cb(&SearchInfo {
                    depth,
                    score,
                    best_move: Some(mv),
                    nodes: self.nodes,
                    elapsed: self.start_time.elapsed(),
                });
            }
            trace!("depth {depth} score {score} best {mv} nodes {}", self.nodes);
            if score.abs() > self.config.decisive_score {
                debug!("decisive score {score} at depth {depth}, stopping");
                break;
            }
        }

        match best {
            Some((mv, score)) => self.result(Some(mv), score, completed, MoveSource::Search),
            None => {
                let fallback = root_moves.first().copied();
                debug!("no iteration completed, falling back to {fallback:?}");
                self.result(fallback, 0, 0, MoveSource::Fallback)
            }
        }
    }

    fn result(&self, best_move: Option<Move>, score: i32, depth: u8, source: MoveSource) -> SearchResult {
        SearchResult {
            best_move,
            score,
            depth,
            nodes: self.nodes,
            elapsed: self.start_time.elapsed(),
            source,
        }
    }

    fn probe_move<B: Board>(&self, board: &B, side: Color) -> Option<Move> {
        if !self.config.use_tt {
            return None;
        }
        self.tt.probe(hash_board(board, side)).and_then(|e| e.best_move())
    }

    /// One iteration at the root. Reorders `root_moves` so the best move is
    /// tried first next time. `None` if interrupted.
    fn search_root<B: Board>(
        &mut self,
        board: &B,
        side: Color,
        root_moves: &mut [Move],
        depth: u8,
    ) -> Option<(i32, Move)> {
        let mut alpha = -INFINITE;
        let mut best_score = -INFINITE;
        let mut best_idx = 0;
        for (i, &mv) in root_moves.iter().enumerate() {
            let mut child = board.clone();
            child.apply_move(mv);
            let score = self.alpha_beta(&child, side.opponent(), depth - 1, alpha, INFINITE)?;
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
            alpha = alpha.max(score);
        }
        root_moves[..=best_idx].rotate_right(1);
        let best = root_moves[0];
        if self.config.use_tt {
            let stored = self.score_to_tt(best_score, side, depth);
            self.tt.store(hash_board(board, side), Some(best), stored, depth, NodeType::Exact);
        }
        Some((best_score, best))
    }

    /// Alpha-beta in minimax form. Returns `None` when the search was stopped.
    pub(crate) fn alpha_beta<B: Board>(
        &mut self,
        board: &B,
        side: Color,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
    ) -> Option<i32> {
        self.nodes += 1;
        if self.should_stop() {
            return None;
        }
        let maximizing = side == self.ai_color;

        if depth == 0 {
            // Only a side in check can be mated; test that cheaply first
            if board.in_check(side) && board.legal_moves(side).is_empty() {
                return Some(mate_score(maximizing, 0));
            }
            return Some(self.evaluator.evaluate(board, self.ai_color));
        }

        let hash = self.config.use_tt.then(|| hash_board(board, side));
        let mut hash_move = None;
        if let Some(entry) = hash.and_then(|h| self.tt.probe(h)) {
            hash_move = entry.best_move();
            if entry.depth() >= depth {
                let score = self.score_from_tt(entry.score(), side, depth);
                match self.bound_for(entry.node_type(), side) {
                    NodeType::Exact => return Some(score),
                    NodeType::LowerBound if score >= beta => return Some(score),
                    NodeType::UpperBound if score <= alpha => return Some(score),
                    _ => {}
                }
            }
        }

        let mut moves = board.legal_moves(side);
        if moves.is_empty() {
            return Some(mate_score(maximizing, depth));
        }
        order_moves(board, &mut moves, hash_move, self.evaluator.config());

        let (alpha_orig, beta_orig) = (alpha, beta);
        let mut best_score = if maximizing { -INFINITE } else { INFINITE };
        let mut best_move = None;
        for mv in moves {
            let mut child = board.clone();
            child.apply_move(mv);
            let score = self.alpha_beta(&child, side.opponent(), depth - 1, alpha, beta)?;
            if maximizing {
                if score > best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                alpha = alpha.max(score);
            } else {
                if score < best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }

        if let Some(h) = hash {
            let node_type = if best_score <= alpha_orig {
                NodeType::UpperBound
            } else if best_score >= beta_orig {
                NodeType::LowerBound
            } else {
                NodeType::Exact
            };
            let stored = self.score_to_tt(best_score, side, depth);
            self.tt.store(h, best_move, stored, depth, self.bound_for(node_type, side));
        }
        Some(best_score)
    }

    /// Searcher score at a node with `depth` remaining -> table score
    fn score_to_tt(&self, score: i32, side: Color, depth: u8) -> i32 {
        let score = if side == self.ai_color { score } else { -score };
        if score >= MATE_BOUND {
            score - depth as i32
        } else if score <= -MATE_BOUND {
            score + depth as i32
        } else {
            score
        }
    }

    /// Inverse of `score_to_tt` at a node with `depth` remaining
    fn score_from_tt(&self, stored: i32, side: Color, depth: u8) -> i32 {
        let score = if stored >= MATE_BOUND {
            stored + depth as i32
        } else if stored <= -MATE_BOUND {
            stored - depth as i32
        } else {
            stored
        };
        if side == self.ai_color { score } else { -score }
    }

    /// Bounds flip together with the score sign
    fn bound_for(&self, node_type: NodeType, side: Color) -> NodeType {
        if side == self.ai_color {
            return node_type;
        }
        match node_type {
            NodeType::Exact => NodeType::Exact,
            NodeType::LowerBound => NodeType::UpperBound,
            NodeType::UpperBound => NodeType::LowerBound,
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        // Acquire pairs with the Release store of whoever cancels
        if let Some(ref stop_flag) = self.limits.stop_flag {
            if stop_flag.load(Ordering::Acquire) {
                self.stopped = true;
                return true;
            }
        }
        if let Some(max_nodes) = self.limits.nodes {
            if self.nodes >= max_nodes {
                self.stopped = true;
                return true;
            }
        }
        if self.nodes % TIME_CHECK_INTERVAL == 0 {
            if let Some(limit) = self.limits.time.or(self.config.time_limit) {
                if self.start_time.elapsed() >= limit {
                    self.stopped = true;
                    return true;
                }
            }
        }
        false
    }
}

/// Score for a side with no legal move; faster mates score higher
#[inline]
fn mate_score(maximizing: bool, remaining_depth: u8) -> i32 {
    let mate = MATE_SCORE + remaining_depth as i32;
    if maximizing { -mate } else { mate }
}
