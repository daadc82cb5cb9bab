//! Seam between the decision layer and an external engine

use rxiangqi_core::CancelToken;
use std::time::Duration;

/// Something that proposes moves for a position string
///
/// Implementations must bound every call by `think_time` plus their own grace
/// period and report failure as `None` or an empty list, never by panicking.
pub trait EngineClient: Send + Sync {
    fn is_available(&self) -> bool;

    /// Best move token for `position`
    fn request_best_move(&self, position: &str, think_time: Duration, cancel: &CancelToken) -> Option<String>;

    /// Up to `count` distinct candidate tokens, best first
    fn request_candidate_moves(
        &self,
        position: &str,
        think_time: Duration,
        count: usize,
        cancel: &CancelToken,
    ) -> Vec<String>;

    /// Label for logs and rationale text
    fn name(&self) -> String {
        "engine".to_string()
    }
}
