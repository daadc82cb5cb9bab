//! Last resort: any legal move

use super::{DecisionContext, DecisionSource, MoveStrategy, Proposal};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rxiangqi_core::Board;
use std::sync::{Mutex, PoisonError};

/// Picks uniformly among the legal moves
pub struct RandomLegalStrategy {
    rng: Mutex<StdRng>,
}

impl Default for RandomLegalStrategy {
    fn default() -> Self {
        RandomLegalStrategy {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl RandomLegalStrategy {
    /// Reproducible choices
    pub fn seeded(seed: u64) -> Self {
        RandomLegalStrategy {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl<B: Board> MoveStrategy<B> for RandomLegalStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn try_move(&self, board: &B, ctx: &DecisionContext<'_>) -> Option<Proposal> {
        let moves = board.legal_moves(ctx.side);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mv = *moves.choose(&mut *rng)?;
        info!("playing random legal move {mv}");
        Some(Proposal::new(mv, DecisionSource::Random))
    }
}
