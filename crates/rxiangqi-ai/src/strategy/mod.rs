//! Move strategies tried in order by the decider
//!
//! Each strategy either proposes a move or declines. The decider walks its
//! list until one proposes; nothing here raises for an unavailable engine or
//! bad engine output.

mod engine;
mod hybrid;
mod random;
mod search;

pub use engine::{EngineStrategy, is_sane, recover_move, resolve_token};
pub use hybrid::HybridStrategy;
pub use random::RandomLegalStrategy;
pub use search::SearchStrategy;

use crate::difficulty::Difficulty;
use crate::history::MoveHistory;
use rxiangqi_core::{Board, CancelToken, Color, Move};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Everything a strategy may read while choosing a move
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext<'a> {
    pub side: Color,
    pub difficulty: Difficulty,
    /// Budget for a single best-move request
    pub think_time: Duration,
    /// Budget for a multi-PV candidate request
    pub candidate_think_time: Duration,
    pub history: &'a MoveHistory,
    pub cancel: &'a CancelToken,
}

/// How a proposed move was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Engine best move, accepted as returned
    Engine,
    /// Engine token matched by re-encoding the legal moves
    EngineRecovered,
    /// Substitute from the engine's candidate list after a repetition
    EngineCandidate,
    /// Repetitive engine move accepted after clearing the history
    EngineRepeated,
    Book,
    Search,
    Random,
}

impl DecisionSource {
    pub fn is_engine(self) -> bool {
        matches!(
            self,
            DecisionSource::Engine
                | DecisionSource::EngineRecovered
                | DecisionSource::EngineCandidate
                | DecisionSource::EngineRepeated
        )
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionSource::Engine => "engine",
            DecisionSource::EngineRecovered => "engine (recovered)",
            DecisionSource::EngineCandidate => "engine candidate",
            DecisionSource::EngineRepeated => "engine (history reset)",
            DecisionSource::Book => "book",
            DecisionSource::Search => "search",
            DecisionSource::Random => "random",
        };
        f.write_str(s)
    }
}

/// A move a strategy is prepared to play
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub mv: Move,
    pub token: String,
    pub source: DecisionSource,
    /// Reset the repetition history before recording this move
    pub clear_history: bool,
}

impl Proposal {
    pub fn new(mv: Move, source: DecisionSource) -> Self {
        Proposal {
            mv,
            token: rxiangqi_core::encode_move(mv),
            source,
            clear_history: false,
        }
    }
}

/// One tier of the decision chain
pub trait MoveStrategy<B: Board>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Propose a move for `ctx.side`, or decline with `None`
    fn try_move(&self, board: &B, ctx: &DecisionContext<'_>) -> Option<Proposal>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rxiangqi_uci::EngineClient;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Engine stand-in returning scripted answers
    #[derive(Default)]
    pub struct ScriptedEngine {
        pub unavailable: AtomicBool,
        pub best: Mutex<VecDeque<Option<String>>>,
        pub candidates: Mutex<Vec<String>>,
        pub best_calls: AtomicUsize,
        pub candidate_calls: AtomicUsize,
        pub delay: Option<Duration>,
    }

    impl ScriptedEngine {
        pub fn with_best(moves: &[&str]) -> Self {
            ScriptedEngine {
                best: Mutex::new(moves.iter().map(|m| Some(m.to_string())).collect()),
                ..ScriptedEngine::default()
            }
        }

        pub fn set_candidates(&self, moves: &[&str]) {
            *self.candidates.lock().unwrap() = moves.iter().map(|m| m.to_string()).collect();
        }
    }

    impl EngineClient for ScriptedEngine {
        fn is_available(&self) -> bool {
            !self.unavailable.load(Ordering::SeqCst)
        }

        fn request_best_move(&self, _position: &str, _think_time: Duration, cancel: &CancelToken) -> Option<String> {
            self.best_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                let start = std::time::Instant::now();
                while start.elapsed() < delay {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
            self.best.lock().unwrap().pop_front().flatten()
        }

        fn request_candidate_moves(
            &self,
            _position: &str,
            _think_time: Duration,
            count: usize,
            _cancel: &CancelToken,
        ) -> Vec<String> {
            self.candidate_calls.fetch_add(1, Ordering::SeqCst);
            self.candidates.lock().unwrap().iter().take(count).cloned().collect()
        }
    }

    pub fn context<'a>(side: Color, history: &'a MoveHistory, cancel: &'a CancelToken) -> DecisionContext<'a> {
        DecisionContext {
            side,
            difficulty: Difficulty::new(1).unwrap(),
            think_time: Duration::from_millis(50),
            candidate_think_time: Duration::from_millis(50),
            history,
            cancel,
        }
    }
}
