//! Engine request and local search run side by side

use super::{DecisionContext, EngineStrategy, MoveStrategy, Proposal, SearchStrategy};
use log::{debug, warn};
use rxiangqi_core::Board;
use std::thread;

/// Runs [`EngineStrategy`] and [`SearchStrategy`] concurrently, each on its
/// own board clone and with its own timeout. The engine move wins when it is
/// usable and was not forced through a history reset; otherwise the local
/// move is played.
pub struct HybridStrategy {
    engine: EngineStrategy,
    search: SearchStrategy,
}

impl HybridStrategy {
    pub fn new(engine: EngineStrategy, search: SearchStrategy) -> Self {
        HybridStrategy { engine, search }
    }
}

impl<B: Board + 'static> MoveStrategy<B> for HybridStrategy {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn try_move(&self, board: &B, ctx: &DecisionContext<'_>) -> Option<Proposal> {
        let engine_board = board.clone();
        let (engine_move, local_move) = thread::scope(|s| {
            let engine = s.spawn(move || MoveStrategy::<B>::try_move(&self.engine, &engine_board, ctx));
            let local = MoveStrategy::<B>::try_move(&self.search, board, ctx);
            let engine = engine.join().unwrap_or_else(|_| {
                warn!("engine request panicked");
                None
            });
            (engine, local)
        });

        match (engine_move, local_move) {
            (Some(e), _) if !e.clear_history => Some(e),
            (Some(e), Some(l)) => {
                debug!("engine move {} only survived a history reset, playing local {}", e.token, l.token);
                Some(l)
            }
            (Some(e), None) => Some(e),
            (None, local) => local,
        }
    }
}
