//! Difficulty levels and the budgets derived from them

use rxiangqi_core::search::depth_for_difficulty;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;

/// Engine think time per level, 1-based
pub const THINK_TIMES_MS: [u64; MAX_DIFFICULTY as usize] =
    [1_500, 3_000, 4_500, 7_000, 10_000, 15_000, 22_000, 30_000, 40_000, 50_000];

/// Bounds for the extended budget used by candidate requests
const CANDIDATE_MIN_MS: u64 = 1_000;
const CANDIDATE_MAX_MS: u64 = 30_000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("difficulty must be within {MIN_DIFFICULTY}..={MAX_DIFFICULTY}, got {0}")]
pub struct InvalidDifficulty(pub u8);

/// Strength level in `1..=10`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn new(level: u8) -> Result<Self, InvalidDifficulty> {
        if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&level) {
            Ok(Difficulty(level))
        } else {
            Err(InvalidDifficulty(level))
        }
    }

    /// Nearest valid level
    pub fn clamped(level: u8) -> Self {
        Difficulty(level.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY))
    }

    #[inline]
    pub fn level(self) -> u8 {
        self.0
    }

    /// Think time from the built-in table
    pub fn think_time(self) -> Duration {
        self.think_time_from(&THINK_TIMES_MS)
    }

    /// Think time from a configured table. Levels past the end of a short
    /// table use its last entry; an empty table falls back to the built-in one.
    pub fn think_time_from(self, table: &[u64]) -> Duration {
        let table = if table.is_empty() { &THINK_TIMES_MS[..] } else { table };
        let idx = (self.0 as usize - 1).min(table.len() - 1);
        Duration::from_millis(table[idx])
    }

    /// Extended budget for multi-PV candidate requests
    pub fn candidate_think_time_from(self, table: &[u64]) -> Duration {
        let base = self.think_time_from(table).as_millis() as u64;
        let tenths: u64 = match self.0 {
            1 => 15,
            2 => 20,
            3 => 25,
            4 => 30,
            5 => 40,
            6..=8 => 50,
            _ => 60,
        };
        Duration::from_millis((base * tenths / 10).clamp(CANDIDATE_MIN_MS, CANDIDATE_MAX_MS))
    }

    /// Local search depth in plies
    pub fn search_depth(self) -> u8 {
        depth_for_difficulty(self.0)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(3)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Difficulty::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
