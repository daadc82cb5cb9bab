//! Error types for move decision

use rxiangqi_core::{CodecError, Color};
use thiserror::Error;

/// Why the external engine produced no usable move. Always absorbed by the
/// decider; the next strategy runs instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineMoveError {
    #[error("engine unavailable")]
    Unavailable,

    #[error("engine returned no move")]
    NoMove,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("engine move {0} matches no legal move")]
    DecodeMismatch(String),

    #[error("repeated move {0} failed re-validation after history reset")]
    Repetitive(String),
}

/// Errors surfaced by [`Decider::decide`](crate::Decider::decide)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("{side} has no legal move")]
    NoLegalMove { side: Color },

    #[error("decision cancelled")]
    Cancelled,
}
