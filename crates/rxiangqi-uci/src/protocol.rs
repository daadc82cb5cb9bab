//! UCI line protocol: outgoing commands and typed engine events

use std::fmt;

/// Evaluation reported in an `info` line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

/// Parsed `info` line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub pv: Vec<String>,
    /// Free text of `info string ...`
    pub string: Option<String>,
}

impl InfoLine {
    /// multipv rank, 1 when absent
    pub fn rank(&self) -> u32 {
        self.multipv.unwrap_or(1)
    }
}

/// One line of engine output
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Id { key: String, value: String },
    Option { name: String },
    UciOk,
    ReadyOk,
    Info(InfoLine),
    /// `bestmove (none)` and `bestmove 0000` carry `best: None`
    BestMove { best: Option<String>, ponder: Option<String> },
    Other(String),
}

/// Parse one line of engine output. Never fails; unknown lines become
/// `EngineEvent::Other`.
pub fn parse_line(line: &str) -> EngineEvent {
    let line = line.trim();
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uciok") => EngineEvent::UciOk,
        Some("readyok") => EngineEvent::ReadyOk,
        Some("id") => match tokens.next() {
            Some(key) => EngineEvent::Id {
                key: key.to_string(),
                value: tokens.collect::<Vec<_>>().join(" "),
            },
            None => EngineEvent::Other(line.to_string()),
        },
        Some("option") => match parse_option_name(line) {
            Some(name) => EngineEvent::Option { name },
            None => EngineEvent::Other(line.to_string()),
        },
        Some("info") => EngineEvent::Info(parse_info(line)),
        Some("bestmove") => {
            let best = tokens.next().filter(|t| !is_null_move(t)).map(str::to_string);
            let ponder = match tokens.next() {
                Some("ponder") => tokens.next().filter(|t| !is_null_move(t)).map(str::to_string),
                _ => None,
            };
            EngineEvent::BestMove { best, ponder }
        }
        _ => EngineEvent::Other(line.to_string()),
    }
}

fn is_null_move(token: &str) -> bool {
    matches!(token, "(none)" | "none" | "0000")
}

/// Extract the option name from an `option name <...> type <...>` line
pub fn parse_option_name(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok == "name" {
            let mut parts = Vec::new();
            while let Some(next) = tokens.next_if(|t| *t != "type") {
                parts.push(next);
            }
            if !parts.is_empty() {
                return Some(parts.join(" "));
            }
        }
    }
    None
}

/// Parse an `info` line into its fields
pub fn parse_info(line: &str) -> InfoLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut info = InfoLine::default();
    let mut i = 1;
    while i < tokens.len() {
        let next = tokens.get(i + 1).copied();
        match tokens[i] {
            "depth" => {
                info.depth = next.and_then(|t| t.parse().ok());
                i += 1;
            }
            "seldepth" => {
                info.seldepth = next.and_then(|t| t.parse().ok());
                i += 1;
            }
            "multipv" => {
                info.multipv = next.and_then(|t| t.parse().ok());
                i += 1;
            }
            "nodes" => {
                info.nodes = next.and_then(|t| t.parse().ok());
                i += 1;
            }
            "nps" => {
                info.nps = next.and_then(|t| t.parse().ok());
                i += 1;
            }
            "time" => {
                info.time_ms = next.and_then(|t| t.parse().ok());
                i += 1;
            }
            "score" => {
                let value = tokens.get(i + 2).and_then(|t| t.parse::<i32>().ok());
                info.score = match (next, value) {
                    (Some("cp"), Some(v)) => Some(Score::Cp(v)),
                    (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => info.score,
                };
                i += 2;
            }
            "pv" => {
                info.pv = tokens[i + 1..].iter().map(|t| t.to_string()).collect();
                break;
            }
            "string" => {
                info.string = Some(tokens[i + 1..].join(" "));
                break;
            }
            _ => {}
        }
        i += 1;
    }
    info
}

/// Parameters of a `go` command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
}

/// Commands sent to the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: Option<String> },
    Position { fen: String },
    Go(GoParams),
    Stop,
    Quit,
}

impl UciCommand {
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        UciCommand::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => f.write_str("uci"),
            UciCommand::IsReady => f.write_str("isready"),
            UciCommand::UciNewGame => f.write_str("ucinewgame"),
            UciCommand::SetOption { name, value: Some(v) } => {
                write!(f, "setoption name {name} value {v}")
            }
            UciCommand::SetOption { name, value: None } => write!(f, "setoption name {name}"),
            UciCommand::Position { fen } => write!(f, "position fen {fen}"),
            UciCommand::Go(params) => {
                f.write_str("go")?;
                if let Some(d) = params.depth {
                    write!(f, " depth {d}")?;
                }
                if let Some(t) = params.movetime_ms {
                    write!(f, " movetime {t}")?;
                }
                Ok(())
            }
            UciCommand::Stop => f.write_str("stop"),
            UciCommand::Quit => f.write_str("quit"),
        }
    }
}
