//! Scripted UCI engine used by the integration tests
//!
//! Answers the handshake, streams multi-PV `info` lines for each `go` and
//! prints a fixed best move. Failure modes are selected with `--mode`.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Behave like a well-formed engine
    Normal,
    /// Handshake normally, then never answer `go` (or anything after it)
    Hang,
    /// Never print anything
    Silent,
    /// Exit with an error status when asked to search
    Crash,
}

#[derive(Parser, Debug)]
#[command(name = "mock_engine", about = "Scripted UCI engine for tests")]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::Normal)]
    mode: Mode,

    /// Move printed after `bestmove`; `none` prints `bestmove (none)`
    #[arg(long, default_value = "h2e2")]
    bestmove: String,

    /// Comma-separated PV heads reported for multipv ranks 1..N
    #[arg(long, value_delimiter = ',')]
    candidates: Vec<String>,

    /// Delay before answering `go`
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Keep running after `quit`
    #[arg(long)]
    ignore_quit: bool,

    /// Advertise no options at all
    #[arg(long)]
    no_options: bool,
}

fn emit(out: &mut impl Write, line: &str) -> io::Result<()> {
    writeln!(out, "{line}")?;
    out.flush()
}

fn hang_forever() -> ! {
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.mode == Mode::Silent {
        hang_forever();
    }

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    let mut multipv = 1usize;

    for line in stdin.lock().lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("uci") => {
                emit(&mut out, "id name MockFish 1.0")?;
                emit(&mut out, "id author rxiangqi tests")?;
                if !args.no_options {
                    for opt in [
                        "option name Threads type spin default 1 min 1 max 512",
                        "option name Hash type spin default 16 min 1 max 33554432",
                        "option name MultiPV type spin default 1 min 1 max 500",
                        "option name Skill Level type spin default 20 min 0 max 20",
                        "option name UCI_Variant type combo default xiangqi var xiangqi",
                    ] {
                        emit(&mut out, opt)?;
                    }
                }
                emit(&mut out, "uciok")?;
            }
            Some("isready") => emit(&mut out, "readyok")?,
            Some("setoption") => {
                let rest: Vec<&str> = tokens.collect();
                if rest.starts_with(&["name", "MultiPV", "value"]) {
                    multipv = rest.get(3).and_then(|v| v.parse().ok()).unwrap_or(1);
                }
            }
            Some("go") => match args.mode {
                Mode::Hang => hang_forever(),
                Mode::Crash => std::process::exit(3),
                _ => {
                    if args.delay_ms > 0 {
                        std::thread::sleep(Duration::from_millis(args.delay_ms));
                    }
                    for (i, head) in args.candidates.iter().take(multipv).enumerate() {
                        let rank = i + 1;
                        let score = 100 - 10 * rank as i32;
                        emit(
                            &mut out,
                            &format!(
                                "info depth 12 seldepth 16 multipv {rank} score cp {score} nodes 4096 nps 409600 time 10 pv {head}"
                            ),
                        )?;
                    }
                    if args.bestmove == "none" {
                        emit(&mut out, "bestmove (none)")?;
                    } else {
                        emit(&mut out, &format!("bestmove {}", args.bestmove))?;
                    }
                }
            },
            Some("quit") => {
                if !args.ignore_quit {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Ok(())
}
