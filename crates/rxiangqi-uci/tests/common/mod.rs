//! Common test utilities for engine adapter tests

#![allow(dead_code)] // These utilities may be used by various test files

use rxiangqi_uci::EngineConfig;
use std::path::PathBuf;
use std::time::Duration;

// Timeout constants for CI stability
pub const T_THINK: Duration = Duration::from_millis(200); // Think-time budget
pub const T_SLACK: Duration = Duration::from_millis(1_500); // Scheduling slack on top of budget + grace

pub const STARTPOS: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

pub fn mock_engine_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mock_engine"))
}

/// Config for the mock engine with short timeouts
pub fn mock_config(args: &[&str]) -> EngineConfig {
    EngineConfig {
        path: mock_engine_path(),
        args: args.iter().map(|s| s.to_string()).collect(),
        handshake_timeout_ms: 2_000,
        ready_timeout_ms: 2_000,
        grace_ms: 300,
        candidate_grace_ms: 300,
        quit_timeout_ms: 500,
        ..EngineConfig::default()
    }
}
