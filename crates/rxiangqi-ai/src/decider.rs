//! Produces exactly one move per call from an ordered strategy chain

use crate::config::AiConfig;
use crate::difficulty::Difficulty;
use crate::error::DecisionError;
use crate::history::MoveHistory;
use crate::rationale::{Rationale, describe_move};
use crate::strategy::{
    DecisionContext, DecisionSource, EngineStrategy, HybridStrategy, MoveStrategy, Proposal, RandomLegalStrategy,
    SearchStrategy, resolve_token,
};
use log::{debug, info};
use rxiangqi_core::search::{EvalConfig, Evaluator, SearchConfig};
use rxiangqi_core::{Board, CancelToken, Color, Move, encode_move, encode_position};
use rxiangqi_uci::EngineClient;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one [`Decider::decide`] call
#[derive(Clone, Debug)]
pub struct Decision {
    pub mv: Move,
    pub token: String,
    pub source: DecisionSource,
    /// Name of the strategy that produced the move
    pub strategy: &'static str,
    pub rationale: Option<Rationale>,
    pub elapsed: Duration,
}

/// A ranked suggestion for the side to move
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub rank: usize,
    pub mv: Move,
    pub token: String,
    pub description: String,
}

/// Move decider for one player
///
/// Owns the player's repetition history, so each side of a game needs its
/// own decider. Engine handles may be shared between deciders.
pub struct Decider<B: Board + 'static> {
    side: Color,
    config: AiConfig,
    strategies: Vec<Box<dyn MoveStrategy<B>>>,
    engine: Option<Arc<dyn EngineClient>>,
    history: MoveHistory,
    evaluator: Evaluator,
}

impl<B: Board + 'static> std::fmt::Debug for Decider<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decider")
            .field("side", &self.side)
            .field("difficulty", &self.config.difficulty)
            .field("strategies", &self.strategy_names())
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .field("history", &self.history)
            .finish()
    }
}

/// Builder for [`Decider`]
pub struct DeciderBuilder {
    side: Color,
    config: AiConfig,
    search: SearchConfig,
    eval: EvalConfig,
    engine: Option<Arc<dyn EngineClient>>,
    seed: Option<u64>,
}

impl DeciderBuilder {
    pub fn new(side: Color) -> Self {
        DeciderBuilder {
            side,
            config: AiConfig::default(),
            search: SearchConfig::default(),
            eval: EvalConfig::default(),
            engine: None,
            seed: None,
        }
    }

    pub fn config(mut self, config: AiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.config.difficulty = difficulty;
        self
    }

    pub fn search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn eval_config(mut self, eval: EvalConfig) -> Self {
        self.eval = eval;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn EngineClient>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Seed for the last-resort random strategy
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build<B: Board + 'static>(self) -> Decider<B> {
        let search =
            SearchStrategy::new(self.search, self.eval.clone()).with_timeout(self.config.search_timeout());
        let random = match self.seed {
            Some(seed) => RandomLegalStrategy::seeded(seed),
            None => RandomLegalStrategy::default(),
        };

        let mut strategies: Vec<Box<dyn MoveStrategy<B>>> = Vec::new();
        if let Some(client) = &self.engine {
            let engine = EngineStrategy::new(client.clone())
                .with_candidate_count(self.config.candidate_count)
                .with_revalidation(self.config.revalidate_after_clear);
            if self.config.hybrid {
                strategies.push(Box::new(HybridStrategy::new(engine, search)));
            } else {
                strategies.push(Box::new(engine));
                strategies.push(Box::new(search));
            }
        } else {
            strategies.push(Box::new(search));
        }
        strategies.push(Box::new(random));

        Decider {
            side: self.side,
            history: MoveHistory::new(self.config.history_capacity),
            config: self.config,
            strategies,
            engine: self.engine,
            evaluator: Evaluator::new(self.eval),
        }
    }
}

impl<B: Board + 'static> Decider<B> {
    pub fn builder(side: Color) -> DeciderBuilder {
        DeciderBuilder::new(side)
    }

    pub fn side(&self) -> Color {
        self.side
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Forget recorded moves, e.g. when a new game starts
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn engine_available(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_available())
    }

    /// Choose a move for this decider's side. Errors only when the side has
    /// no legal move or the caller cancelled.
    pub fn decide(&mut self, board: &B, cancel: &CancelToken) -> Result<Decision, DecisionError> {
        let start = Instant::now();
        let side = self.side;
        if board.legal_moves(side).is_empty() {
            info!("{side} has no legal move ({:?})", board.game_state(side));
            return Err(DecisionError::NoLegalMove { side });
        }

        let (proposal, strategy) = {
            let ctx = DecisionContext {
                side,
                difficulty: self.config.difficulty,
                think_time: self.config.think_time(),
                candidate_think_time: self.config.candidate_think_time(),
                history: &self.history,
                cancel,
            };
            self.run_chain(board, &ctx)?
        };

        if proposal.clear_history {
            self.history.clear();
        }
        self.history.push(proposal.token.clone());

        let rationale = if self.config.rationale {
            Rationale::build(&self.evaluator, board, proposal.mv, side)
        } else {
            None
        };
        let decision = Decision {
            mv: proposal.mv,
            token: proposal.token,
            source: proposal.source,
            strategy,
            rationale,
            elapsed: start.elapsed(),
        };
        info!(
            "{side} plays {} via {} in {:?}",
            decision.token, decision.source, decision.elapsed
        );
        Ok(decision)
    }

    fn run_chain(&self, board: &B, ctx: &DecisionContext<'_>) -> Result<(Proposal, &'static str), DecisionError> {
        for strategy in &self.strategies {
            if ctx.cancel.is_cancelled() {
                return Err(DecisionError::Cancelled);
            }
            let tier_start = Instant::now();
            match strategy.try_move(board, ctx) {
                Some(proposal) => return Ok((proposal, strategy.name())),
                None => debug!("{} declined after {:?}", strategy.name(), tier_start.elapsed()),
            }
        }
        if ctx.cancel.is_cancelled() {
            Err(DecisionError::Cancelled)
        } else {
            Err(DecisionError::NoLegalMove { side: ctx.side })
        }
    }

    /// Up to `count` ranked suggestions for `side`: the engine's multi-PV
    /// candidates when it is available, otherwise legal moves ranked by the
    /// evaluation after one ply. Does not touch the history.
    pub fn recommend(&self, board: &B, side: Color, count: usize, cancel: &CancelToken) -> Vec<Recommendation> {
        if count == 0 {
            return Vec::new();
        }
        let mut moves: Vec<Move> = Vec::new();
        if let Some(engine) = self.engine.as_ref().filter(|e| e.is_available()) {
            let position = encode_position(board, side);
            let think_time = self.config.candidate_think_time();
            for token in engine.request_candidate_moves(&position, think_time, count, cancel) {
                match resolve_token(board, side, token.trim()) {
                    Ok((mv, _)) if !moves.contains(&mv) => moves.push(mv),
                    Ok(_) => {}
                    Err(e) => debug!("dropping engine suggestion {token}: {e}"),
                }
            }
        }
        if moves.is_empty() {
            moves = self.rank_locally(board, side);
        }

        moves
            .into_iter()
            .take(count)
            .enumerate()
            .filter_map(|(i, mv)| {
                Some(Recommendation {
                    rank: i + 1,
                    mv,
                    token: encode_move(mv),
                    description: describe_move(board, mv)?,
                })
            })
            .collect()
    }

    fn rank_locally(&self, board: &B, side: Color) -> Vec<Move> {
        let mut scored: Vec<(i32, Move)> = board
            .legal_moves(side)
            .into_iter()
            .map(|mv| {
                let mut next = board.clone();
                next.apply_move(mv);
                (self.evaluator.evaluate(&next, side), mv)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, mv)| mv).collect()
    }
}
