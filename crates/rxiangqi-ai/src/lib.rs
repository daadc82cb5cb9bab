//! Move decision for a computer-controlled xiangqi player
//!
//! [`Decider`] prefers an external UCI engine and degrades to the local
//! search, then to any legal move. Engine trouble never reaches the caller:
//! a decision either yields a move or reports that none exists.

pub mod config;
pub mod decider;
pub mod difficulty;
pub mod error;
pub mod history;
pub mod rationale;
pub mod strategy;

pub use config::{AiConfig, AppConfig};
pub use decider::{Decider, DeciderBuilder, Decision, Recommendation};
pub use difficulty::{Difficulty, InvalidDifficulty, THINK_TIMES_MS};
pub use error::{DecisionError, EngineMoveError};
pub use history::MoveHistory;
pub use rationale::{Rationale, describe_move};
pub use strategy::{DecisionContext, DecisionSource, MoveStrategy, Proposal};
