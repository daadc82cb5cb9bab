//! Engine subprocess: pipes, reader thread and bounded termination

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::protocol::UciCommand;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use log::{debug, trace, warn};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

pub const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of a bounded read
#[derive(Debug, PartialEq, Eq)]
pub enum ReadResult {
    Line(String),
    Timeout,
}

/// One engine subprocess with a line reader thread on its stdout
///
/// The reader thread owns stdout and forwards lines into a channel, so reads
/// on this side are always bounded by `recv_timeout`. The thread exits when
/// the pipe closes, which happens at the latest when the child is killed.
pub struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    label: String,
    exited: bool,
}

impl EngineProcess {
    pub fn spawn(cfg: &EngineConfig) -> Result<Self> {
        let label = cfg
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cfg.path.display().to_string());

        let mut cmd = Command::new(&cfg.path);
        if !cfg.args.is_empty() {
            cmd.args(&cfg.args);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: cfg.path.display().to_string(),
                source,
            })?;
        let stdin = child.stdin.take().ok_or(EngineError::Unavailable("no stdin pipe"))?;
        let stdout = child.stdout.take().ok_or(EngineError::Unavailable("no stdout pipe"))?;

        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let reader_label = label.clone();
        std::thread::Builder::new()
            .name(format!("{label}-reader"))
            .spawn(move || {
                let reader = BufReader::new(stdout);
                for line in reader.lines() {
                    match line {
                        Ok(l) => {
                            if tx.send(l).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                trace!("{reader_label}: reader thread finished");
            })?;

        debug!("{label}: spawned pid {}", child.id());
        Ok(EngineProcess {
            child,
            stdin: BufWriter::new(stdin),
            rx,
            label,
            exited: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn send(&mut self, cmd: &UciCommand) -> Result<()> {
        self.write_line(&cmd.to_string())
    }

    pub fn write_line(&mut self, msg: &str) -> Result<()> {
        debug!("{} > {}", self.label, msg);
        self.stdin.write_all(msg.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Wait up to `timeout` for the next line
    pub fn recv_line(&mut self, timeout: Duration) -> Result<ReadResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => {
                trace!("{} < {}", self.label, line);
                Ok(ReadResult::Line(line))
            }
            Err(RecvTimeoutError::Timeout) => {
                if self.is_alive() {
                    Ok(ReadResult::Timeout)
                } else {
                    Err(EngineError::Exited)
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.exited = true;
                Err(EngineError::Exited)
            }
        }
    }

    /// Read lines until `pred` accepts one or `timeout` elapses
    pub fn wait_for<F>(&mut self, timeout: Duration, expected: &'static str, mut pred: F) -> Result<()>
    where
        F: FnMut(&str) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::HandshakeTimeout { expected, timeout });
            }
            match self.recv_line(remaining)? {
                ReadResult::Line(line) if pred(&line) => return Ok(()),
                ReadResult::Line(_) => {}
                ReadResult::Timeout => return Err(EngineError::HandshakeTimeout { expected, timeout }),
            }
        }
    }

    /// `isready` / `readyok` round trip
    pub fn sync_ready(&mut self, timeout: Duration) -> Result<()> {
        self.send(&UciCommand::IsReady)?;
        self.wait_for(timeout, "readyok", |line| line.trim() == "readyok")
    }

    /// Discard everything already buffered; returns the number of lines dropped
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    trace!("{} < {} (stale)", self.label, line);
                    dropped += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.exited = true;
                    break;
                }
            }
        }
        dropped
    }

    /// Whether the child is still running
    pub fn is_alive(&mut self) -> bool {
        if self.exited {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!("{}: exited with {status}", self.label);
                self.exited = true;
                false
            }
            Err(e) => {
                warn!("{}: try_wait failed: {e}", self.label);
                false
            }
        }
    }

    /// Send `quit`, wait up to `grace` for a clean exit, then kill
    pub fn terminate(&mut self, grace: Duration) {
        if !self.exited {
            let _ = self.send(&UciCommand::Quit);
            let deadline = Instant::now() + grace;
            while Instant::now() < deadline {
                if let Ok(Some(_)) = self.child.try_wait() {
                    self.exited = true;
                    debug!("{}: exited after quit", self.label);
                    return;
                }
                std::thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
            }
            warn!("{}: did not exit within {grace:?}, killing", self.label);
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.exited = true;
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.terminate(Duration::from_millis(300));
    }
}
