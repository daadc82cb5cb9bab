//! Local search tier on a worker thread with an outer timeout

use super::{DecisionContext, DecisionSource, MoveStrategy, Proposal};
use crossbeam_channel::{RecvTimeoutError, bounded};
use log::{debug, warn};
use rxiangqi_core::Board;
use rxiangqi_core::search::{EvalConfig, MoveSource, SearchConfig, SearchLimits, SearchResult, Searcher, TranspositionTable};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of the cancellation check while waiting for the worker
const POLL_SLICE: Duration = Duration::from_millis(10);
/// How long a stopped worker gets to hand back its partial result
const STOP_GRACE: Duration = Duration::from_millis(250);

/// Runs [`Searcher`] on a clone of the board
pub struct SearchStrategy {
    config: SearchConfig,
    eval: EvalConfig,
    tt: Arc<TranspositionTable>,
    /// Outer wall-clock limit; `None` uses the context's think time
    timeout: Option<Duration>,
}

impl SearchStrategy {
    pub fn new(config: SearchConfig, eval: EvalConfig) -> Self {
        let tt = Arc::new(TranspositionTable::new(config.tt_entries));
        SearchStrategy {
            config,
            eval,
            tt,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// Search `board` for `ctx.side`. `None` on cancellation, when the
    /// worker misses its deadline, or when the side has no move.
    pub fn run<B: Board + 'static>(&self, board: &B, ctx: &DecisionContext<'_>) -> Option<SearchResult> {
        let timeout = self.timeout.unwrap_or(ctx.think_time);
        let config = SearchConfig {
            max_depth: ctx.difficulty.search_depth(),
            ..self.config.clone()
        };
        let stop = Arc::new(AtomicBool::new(false));
        let limits = SearchLimits {
            time: Some(timeout),
            stop_flag: Some(stop.clone()),
            ..SearchLimits::default()
        };
        let mut searcher = Searcher::new(config, self.eval.clone())
            .with_tt(self.tt.clone())
            .with_limits(limits);

        let (tx, rx) = bounded::<SearchResult>(1);
        let worker_board = board.clone();
        let side = ctx.side;
        let spawned = thread::Builder::new().name("rxiangqi-search".into()).spawn(move || {
            let result = searcher.search(&worker_board, side);
            let _ = tx.send(result);
        });
        if let Err(e) = spawned {
            warn!("failed to spawn search worker: {e}");
            return None;
        }

        let start = Instant::now();
        let deadline = timeout + STOP_GRACE;
        loop {
            if ctx.cancel.is_cancelled() {
                stop.store(true, Ordering::Release);
                debug!("local search cancelled");
                return None;
            }
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                stop.store(true, Ordering::Release);
                warn!("local search missed its {timeout:?} budget, abandoning worker");
                return None;
            }
            match rx.recv_timeout((deadline - elapsed).min(POLL_SLICE)) {
                Ok(result) => {
                    debug!(
                        "local search: {:?} score {} depth {} nodes {} in {:?}",
                        result.best_move, result.score, result.depth, result.nodes, result.elapsed
                    );
                    return Some(result);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("search worker exited without a result");
                    return None;
                }
            }
        }
    }
}

impl<B: Board + 'static> MoveStrategy<B> for SearchStrategy {
    fn name(&self) -> &'static str {
        "search"
    }

    fn try_move(&self, board: &B, ctx: &DecisionContext<'_>) -> Option<Proposal> {
        let result = self.run(board, ctx)?;
        let mv = result.best_move?;
        let source = match result.source {
            MoveSource::Book => DecisionSource::Book,
            MoveSource::Search | MoveSource::Fallback => DecisionSource::Search,
        };
        Some(Proposal::new(mv, source))
    }
}
