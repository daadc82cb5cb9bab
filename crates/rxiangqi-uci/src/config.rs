//! Engine process settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable
    pub path: PathBuf,
    pub args: Vec<String>,
    pub threads: usize,
    pub hash_mb: u32,
    /// Sent as `Skill Level` when set
    pub skill_level: Option<u8>,
    /// Sent as `UCI_Variant` when set (`xiangqi` for Fairy-Stockfish)
    pub variant: Option<String>,
    /// Extra options in `Name=Value` form
    pub options: Vec<String>,
    /// Wait for `uciok`
    pub handshake_timeout_ms: u64,
    /// Wait for `readyok`
    pub ready_timeout_ms: u64,
    /// Added to the think time before a best-move request gives up
    pub grace_ms: u64,
    /// Added to the think time before a candidate request gives up
    pub candidate_grace_ms: u64,
    /// Wait for the process to exit after `quit` before killing it
    pub quit_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            path: PathBuf::from("pikafish"),
            args: Vec::new(),
            threads: 2,
            hash_mb: 64,
            skill_level: None,
            variant: None,
            options: Vec::new(),
            handshake_timeout_ms: 10_000,
            ready_timeout_ms: 10_000,
            grace_ms: 1_000,
            candidate_grace_ms: 2_000,
            quit_timeout_ms: 3_000,
        }
    }
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EngineConfig {
            path: path.into(),
            ..EngineConfig::default()
        }
    }

    /// Settings for Fairy-Stockfish, which needs the variant selected
    pub fn fairy_stockfish(path: impl Into<PathBuf>) -> Self {
        EngineConfig {
            variant: Some("xiangqi".to_string()),
            ..EngineConfig::new(path)
        }
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn candidate_grace(&self) -> Duration {
        Duration::from_millis(self.candidate_grace_ms)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_millis(self.quit_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            path = "/opt/fairy-stockfish"
            variant = "xiangqi"
            hash_mb = 128
            options = ["EvalFile=pikafish.nnue"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.path, PathBuf::from("/opt/fairy-stockfish"));
        assert_eq!(cfg.variant.as_deref(), Some("xiangqi"));
        assert_eq!(cfg.hash_mb, 128);
        assert_eq!(cfg.threads, 2);
        assert_eq!(cfg.grace(), Duration::from_secs(1));
        assert_eq!(cfg.options, vec!["EvalFile=pikafish.nnue".to_string()]);
    }

    #[test]
    fn test_fairy_stockfish_selects_variant() {
        let cfg = EngineConfig::fairy_stockfish("fairy-stockfish");
        assert_eq!(cfg.variant.as_deref(), Some("xiangqi"));
        assert_eq!(cfg.path, PathBuf::from("fairy-stockfish"));
    }
}
