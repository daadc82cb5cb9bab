//! TOML configuration for the decider and the CLI

use crate::difficulty::{Difficulty, THINK_TIMES_MS};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use anyhow::{Context, Result};
use rxiangqi_core::search::{EvalConfig, SearchConfig};
use rxiangqi_uci::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Decision-layer settings (`[ai]`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    /// Engine think time per difficulty level
    pub think_times_ms: Vec<u64>,
    pub history_capacity: usize,
    /// Alternatives requested when the engine move is repetitive
    pub candidate_count: usize,
    /// Re-check legality and safety of a repetitive move kept after the
    /// history reset
    pub revalidate_after_clear: bool,
    /// Run engine and local search concurrently
    pub hybrid: bool,
    /// Outer limit for the local search; defaults to the think time
    pub search_timeout_ms: Option<u64>,
    /// Attach an explanation to each decision
    pub rationale: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            difficulty: Difficulty::default(),
            think_times_ms: THINK_TIMES_MS.to_vec(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            candidate_count: 5,
            revalidate_after_clear: true,
            hybrid: false,
            search_timeout_ms: None,
            rationale: true,
        }
    }
}

impl AiConfig {
    pub fn think_time(&self) -> Duration {
        self.difficulty.think_time_from(&self.think_times_ms)
    }

    pub fn candidate_think_time(&self) -> Duration {
        self.difficulty.candidate_think_time_from(&self.think_times_ms)
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_ms.map(Duration::from_millis)
    }
}

/// Whole configuration file. A missing `[engine]` table means no external
/// engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: Option<EngineConfig>,
    pub ai: AiConfig,
    pub search: SearchConfig,
    pub eval: EvalConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
