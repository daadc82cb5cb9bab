//! UCI engine session: handshake, requests with watchdog, shutdown

use crate::client::EngineClient;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::process::{EngineProcess, ReadResult};
use crate::protocol::{EngineEvent, GoParams, InfoLine, UciCommand, parse_line};
use log::{debug, info, warn};
use rxiangqi_core::CancelToken;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Granularity of the watchdog loop
const POLL_SLICE: Duration = Duration::from_millis(20);
/// How long to wait for `readyok` when resynchronising after an abandoned search
const RESYNC_TIMEOUT: Duration = Duration::from_millis(1_500);

/// Engine search depth for a think-time budget (step function)
pub fn search_depth_for(think_time: Duration) -> u32 {
    match think_time.as_millis() {
        0..=300 => 12,
        301..=800 => 14,
        801..=1_500 => 16,
        1_501..=2_500 => 18,
        2_501..=4_000 => 20,
        4_001..=6_000 => 22,
        6_001..=10_000 => 24,
        10_001..=15_000 => 26,
        15_001..=25_000 => 28,
        _ => 30,
    }
}

/// Lifecycle of a session; never goes back from `Terminated`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Handshaking,
    Ready,
    Busy,
    Terminated,
}

/// Snapshot of a session for diagnostics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineStatus {
    pub state: EngineState,
    pub available: bool,
    pub name: Option<String>,
    pub author: Option<String>,
    pub options: Vec<String>,
}

/// Result of one `go` round
#[derive(Clone, Debug, Default)]
pub struct SearchOutcome {
    pub best_move: Option<String>,
    /// Latest PV report per multipv rank
    pub lines: BTreeMap<u32, InfoLine>,
    pub elapsed: Duration,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl SearchOutcome {
    /// Distinct candidate tokens in rank order, the best move included,
    /// at most `count` of them
    pub fn candidates(&self, count: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(count + 1);
        for line in self.lines.values() {
            if let Some(mv) = line.pv.first() {
                if !out.contains(mv) {
                    out.push(mv.clone());
                }
            }
        }
        if let Some(best) = &self.best_move {
            if !out.contains(best) {
                out.insert(0, best.clone());
            }
        }
        out.truncate(count);
        out
    }
}

struct Session {
    state: EngineState,
    process: Option<EngineProcess>,
    name: Option<String>,
    author: Option<String>,
    options: Vec<String>,
    /// A previous search was abandoned; stale output may still arrive
    needs_resync: bool,
}

/// Handle to one external engine process
///
/// All traffic is serialised through an internal mutex; concurrent callers
/// queue. Every request is bounded by its think time plus a grace period and
/// never fails loudly: errors turn into `None`/empty results and, when the
/// process is gone, into `is_available() == false`.
pub struct UciEngine {
    config: EngineConfig,
    session: Mutex<Session>,
    available: AtomicBool,
}

impl UciEngine {
    pub fn new(config: EngineConfig) -> Self {
        UciEngine {
            config,
            session: Mutex::new(Session {
                state: EngineState::Uninitialized,
                process: None,
                name: None,
                author: None,
                options: Vec::new(),
                needs_resync: false,
            }),
            available: AtomicBool::new(false),
        }
    }

    /// Create and initialize; `None` if the engine could not be brought up
    pub fn start(config: EngineConfig) -> Option<Self> {
        let engine = UciEngine::new(config);
        engine.initialize().then_some(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the process and perform the handshake. Returns whether the
    /// engine is ready; a second call reports the current readiness.
    pub fn initialize(&self) -> bool {
        let mut session = self.lock();
        if session.state != EngineState::Uninitialized {
            return session.state == EngineState::Ready;
        }
        session.state = EngineState::Handshaking;

        let mut process = match EngineProcess::spawn(&self.config) {
            Ok(p) => p,
            Err(e) => {
                warn!("engine unavailable: {e}");
                session.state = EngineState::Terminated;
                return false;
            }
        };

        match self.handshake(&mut process, &mut session) {
            Ok(()) => {
                info!(
                    "engine ready: {} ({} options)",
                    session.name.as_deref().unwrap_or(process.label()),
                    session.options.len()
                );
                session.process = Some(process);
                session.state = EngineState::Ready;
                self.available.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                warn!("engine handshake failed: {e}");
                process.terminate(self.config.quit_timeout());
                session.state = EngineState::Terminated;
                false
            }
        }
    }

    fn handshake(&self, process: &mut EngineProcess, session: &mut Session) -> Result<()> {
        let cfg = &self.config;
        process.send(&UciCommand::Uci)?;
        let mut name = None;
        let mut author = None;
        let mut options = Vec::new();
        process.wait_for(cfg.handshake_timeout(), "uciok", |line| match parse_line(line) {
            EngineEvent::Id { key, value } => {
                match key.as_str() {
                    "name" => name = Some(value),
                    "author" => author = Some(value),
                    _ => {}
                }
                false
            }
            EngineEvent::Option { name } => {
                options.push(name);
                false
            }
            EngineEvent::UciOk => true,
            _ => false,
        })?;
        session.name = name;
        session.author = author;
        session.options = options;

        let has = |opt: &str| session.options.is_empty() || session.options.iter().any(|o| o == opt);
        let mut settings: Vec<UciCommand> = Vec::new();
        if let Some(variant) = &cfg.variant {
            // Must precede the rest: it resets variant-dependent options
            if has("UCI_Variant") {
                settings.push(UciCommand::set_option("UCI_Variant", variant));
            }
        }
        if has("Threads") {
            settings.push(UciCommand::set_option("Threads", cfg.threads));
        }
        if has("Hash") {
            settings.push(UciCommand::set_option("Hash", cfg.hash_mb));
        }
        if let Some(level) = cfg.skill_level {
            if has("Skill Level") {
                settings.push(UciCommand::set_option("Skill Level", level));
            }
        }
        for opt in &cfg.options {
            match opt.split_once('=') {
                Some((name, value)) if has(name.trim()) => {
                    settings.push(UciCommand::set_option(name.trim(), value.trim()));
                }
                Some(_) => debug!("engine does not advertise option '{opt}', skipped"),
                None => settings.push(UciCommand::SetOption {
                    name: opt.trim().to_string(),
                    value: None,
                }),
            }
        }
        for cmd in &settings {
            process.send(cmd)?;
        }

        process.sync_ready(cfg.ready_timeout())?;
        process.send(&UciCommand::UciNewGame)?;
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn status(&self) -> EngineStatus {
        let session = self.lock();
        EngineStatus {
            state: session.state,
            available: self.is_available(),
            name: session.name.clone(),
            author: session.author.clone(),
            options: session.options.clone(),
        }
    }

    /// Best move for a position string, or `None` on timeout, cancellation,
    /// `bestmove (none)` or any engine failure
    pub fn request_best_move(
        &self,
        position: &str,
        think_time: Duration,
        cancel: &CancelToken,
    ) -> Option<String> {
        self.run(position, think_time, 1, self.config.grace(), cancel)
            .and_then(|outcome| outcome.best_move)
    }

    /// Up to `count` distinct candidate moves (multi-PV), best move included
    pub fn request_candidate_moves(
        &self,
        position: &str,
        think_time: Duration,
        count: usize,
        cancel: &CancelToken,
    ) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }
        self.run(position, think_time, count, self.config.candidate_grace(), cancel)
            .map(|outcome| outcome.candidates(count))
            .unwrap_or_default()
    }

    /// Full search round with the raw outcome
    pub fn analyze(
        &self,
        position: &str,
        think_time: Duration,
        multipv: usize,
        cancel: &CancelToken,
    ) -> Option<SearchOutcome> {
        self.run(position, think_time, multipv.max(1), self.config.grace(), cancel)
    }

    fn run(
        &self,
        position: &str,
        think_time: Duration,
        multipv: usize,
        grace: Duration,
        cancel: &CancelToken,
    ) -> Option<SearchOutcome> {
        if !self.is_available() {
            return None;
        }
        let mut session = self.lock();
        if session.state != EngineState::Ready {
            return None;
        }
        let Some(mut process) = session.process.take() else {
            return None;
        };
        session.state = EngineState::Busy;

        let result = self.search(&mut process, &mut session, position, think_time, multipv, grace, cancel);
        match result {
            Ok(outcome) => {
                session.process = Some(process);
                session.state = EngineState::Ready;
                if outcome.timed_out {
                    warn!("engine gave no move within {think_time:?} (+{grace:?} grace)");
                }
                Some(outcome)
            }
            Err(e) => {
                warn!("engine failure, marking unavailable: {e}");
                self.available.store(false, Ordering::Release);
                process.terminate(self.config.quit_timeout());
                session.state = EngineState::Terminated;
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        process: &mut EngineProcess,
        session: &mut Session,
        position: &str,
        think_time: Duration,
        multipv: usize,
        grace: Duration,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome> {
        if session.needs_resync {
            let dropped = process.drain();
            debug!("resynchronising after abandoned search ({dropped} stale lines)");
            // bestmove of the abandoned search may still be in flight
            process.send(&UciCommand::Stop)?;
            process.sync_ready(RESYNC_TIMEOUT)?;
            session.needs_resync = false;
        } else {
            process.drain();
        }

        process.send(&UciCommand::Position {
            fen: position.to_string(),
        })?;
        if session.options.is_empty() || session.options.iter().any(|o| o == "MultiPV") {
            process.send(&UciCommand::set_option("MultiPV", multipv))?;
        }
        process.send(&UciCommand::Go(GoParams {
            depth: Some(search_depth_for(think_time)),
            movetime_ms: None,
        }))?;

        let start = Instant::now();
        let hard_limit = think_time + grace;
        let soft_limit = think_time + grace / 2;
        let mut stop_sent = false;
        let mut outcome = SearchOutcome::default();

        loop {
            let elapsed = start.elapsed();
            if cancel.is_cancelled() {
                if !stop_sent {
                    process.send(&UciCommand::Stop)?;
                }
                debug!("engine request cancelled after {elapsed:?}");
                session.needs_resync = true;
                outcome.cancelled = true;
                outcome.elapsed = elapsed;
                return Ok(outcome);
            }
            if elapsed >= hard_limit {
                session.needs_resync = true;
                outcome.timed_out = true;
                outcome.elapsed = elapsed;
                return Ok(outcome);
            }
            if elapsed >= soft_limit && !stop_sent {
                process.send(&UciCommand::Stop)?;
                stop_sent = true;
            }

            let next_deadline = if stop_sent { hard_limit } else { soft_limit };
            let wait = next_deadline.saturating_sub(elapsed).min(POLL_SLICE);
            match process.recv_line(wait)? {
                ReadResult::Timeout => {}
                ReadResult::Line(line) => match parse_line(&line) {
                    EngineEvent::Info(info) if !info.pv.is_empty() => {
                        outcome.lines.insert(info.rank(), info);
                    }
                    EngineEvent::BestMove { best, .. } => {
                        outcome.best_move = best;
                        outcome.elapsed = start.elapsed();
                        return Ok(outcome);
                    }
                    _ => {}
                },
            }
        }
    }

    /// Stop the process (quit, bounded wait, kill). Idempotent.
    pub fn shutdown(&self) {
        self.available.store(false, Ordering::Release);
        let mut session = self.lock();
        if let Some(mut process) = session.process.take() {
            info!("shutting down engine {}", process.label());
            process.terminate(self.config.quit_timeout());
        }
        session.state = EngineState::Terminated;
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EngineClient for UciEngine {
    fn is_available(&self) -> bool {
        UciEngine::is_available(self)
    }

    fn request_best_move(&self, position: &str, think_time: Duration, cancel: &CancelToken) -> Option<String> {
        UciEngine::request_best_move(self, position, think_time, cancel)
    }

    fn request_candidate_moves(
        &self,
        position: &str,
        think_time: Duration,
        count: usize,
        cancel: &CancelToken,
    ) -> Vec<String> {
        UciEngine::request_candidate_moves(self, position, think_time, count, cancel)
    }

    fn name(&self) -> String {
        self.status().name.unwrap_or_else(|| self.config.path.display().to_string())
    }
}
