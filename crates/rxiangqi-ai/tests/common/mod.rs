//! Common test utilities for decision tests

#![allow(dead_code)] // These utilities may be used by various test files

use rxiangqi_ai::{AiConfig, Decider, Difficulty};
use rxiangqi_core::search::SearchConfig;
use rxiangqi_core::{CancelToken, Color, Position};
use rxiangqi_uci::EngineClient;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// In-process engine stand-in with scripted answers
#[derive(Default)]
pub struct FakeEngine {
    pub unavailable: AtomicBool,
    pub best: Mutex<VecDeque<String>>,
    pub candidates: Mutex<Vec<String>>,
    /// Simulated thinking; cancellation cuts it short
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeEngine {
    pub fn scripted(best: &[&str]) -> Self {
        FakeEngine {
            best: Mutex::new(best.iter().map(|s| s.to_string()).collect()),
            ..FakeEngine::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        FakeEngine {
            delay,
            ..FakeEngine::default()
        }
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }
}

impl EngineClient for FakeEngine {
    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn request_best_move(&self, _position: &str, _think_time: Duration, cancel: &CancelToken) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let start = Instant::now();
        while start.elapsed() < self.delay {
            if cancel.is_cancelled() {
                return None;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.best.lock().unwrap().pop_front()
    }

    fn request_candidate_moves(
        &self,
        _position: &str,
        _think_time: Duration,
        count: usize,
        _cancel: &CancelToken,
    ) -> Vec<String> {
        self.candidates.lock().unwrap().iter().take(count).cloned().collect()
    }

    fn name(&self) -> String {
        "fake".to_string()
    }
}

/// Small and fast local search settings
pub fn quick_search() -> SearchConfig {
    SearchConfig {
        tt_entries: 1 << 12,
        ..SearchConfig::default()
    }
}

pub fn ai_config(level: u8) -> AiConfig {
    AiConfig {
        difficulty: Difficulty::new(level).unwrap(),
        search_timeout_ms: Some(5_000),
        ..AiConfig::default()
    }
}

pub fn local_decider(side: Color, seed: u64) -> Decider<Position> {
    Decider::<Position>::builder(side)
        .config(ai_config(1))
        .search_config(quick_search())
        .random_seed(seed)
        .build()
}
