//! rxiangqi command line: pick a move for a position, or play a game against itself

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rxiangqi_ai::{AppConfig, Decider, Decision, DecisionError, Difficulty};
use rxiangqi_core::{Board, CancelToken, Color, Position, STARTPOS_FEN};
use rxiangqi_uci::{EngineClient, EngineConfig, UciEngine};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// External UCI engine executable (overrides the config file)
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// UCI_Variant to select (e.g. xiangqi for Fairy-Stockfish)
    #[arg(long, global = true)]
    variant: Option<String>,

    /// Difficulty level 1-10 (overrides the config file)
    #[arg(long, global = true, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Choose a move for one position
    Bestmove(BestmoveArgs),
    /// List ranked suggestions for one position
    Recommend(RecommendArgs),
    /// Let two deciders play each other
    Selfplay(SelfplayArgs),
}

#[derive(Args, Debug)]
struct BestmoveArgs {
    /// Position string; defaults to the start position
    #[arg(long, default_value = STARTPOS_FEN)]
    fen: String,

    /// Side to move (overrides the position string)
    #[arg(long, value_enum)]
    side: Option<Side>,

    /// Print the decision as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    #[arg(long, default_value = STARTPOS_FEN)]
    fen: String,

    #[arg(long, value_enum)]
    side: Option<Side>,

    #[arg(long, default_value_t = 3)]
    count: usize,
}

#[derive(Args, Debug)]
struct SelfplayArgs {
    /// Maximum number of plies
    #[arg(long, default_value_t = 40)]
    plies: usize,

    /// Starting position
    #[arg(long, default_value = STARTPOS_FEN)]
    fen: String,

    /// Seed for the last-resort random strategy
    #[arg(long)]
    seed: Option<u64>,

    /// Print one JSON object per ply
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Side {
    Red,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Color {
        match side {
            Side::Red => Color::Red,
            Side::Black => Color::Black,
        }
    }
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    let level: u8 = s.parse().map_err(|e| format!("{e}"))?;
    Difficulty::new(level).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct DecisionReport<'a> {
    ply: Option<usize>,
    side: Color,
    token: &'a str,
    source: rxiangqi_ai::DecisionSource,
    strategy: &'a str,
    elapsed_ms: u128,
    rationale: Option<String>,
    fen: String,
}

impl<'a> DecisionReport<'a> {
    fn new(decision: &'a Decision, side: Color, ply: Option<usize>, fen: String) -> Self {
        DecisionReport {
            ply,
            side,
            token: &decision.token,
            source: decision.source,
            strategy: decision.strategy,
            elapsed_ms: decision.elapsed.as_millis(),
            rationale: decision.rationale.as_ref().map(|r| r.summary()),
            fen,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    );
    builder
        .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(path) = &cli.engine {
        let mut engine = config.engine.take().unwrap_or_default();
        engine.path = path.clone();
        config.engine = Some(engine);
    }
    if let Some(variant) = &cli.variant {
        if let Some(engine) = config.engine.as_mut() {
            engine.variant = Some(variant.clone());
        }
    }
    if let Some(difficulty) = cli.difficulty {
        config.ai.difficulty = difficulty;
    }

    let engine = config.engine.clone().map(start_engine);
    match cli.command {
        Command::Bestmove(args) => bestmove(&config, engine, args),
        Command::Recommend(args) => recommend(&config, engine, args),
        Command::Selfplay(args) => selfplay(&config, engine, args),
    }
}

fn start_engine(config: EngineConfig) -> Arc<UciEngine> {
    let engine = UciEngine::new(config);
    if !engine.initialize() {
        log::warn!("external engine unavailable, using local search only");
    }
    Arc::new(engine)
}

fn make_decider(
    config: &AppConfig,
    engine: Option<&Arc<UciEngine>>,
    side: Color,
    seed: Option<u64>,
) -> Decider<Position> {
    let mut builder = Decider::<Position>::builder(side)
        .config(config.ai.clone())
        .search_config(config.search.clone())
        .eval_config(config.eval.clone());
    if let Some(engine) = engine {
        builder = builder.engine(engine.clone() as Arc<dyn EngineClient>);
    }
    if let Some(seed) = seed {
        builder = builder.random_seed(seed);
    }
    builder.build()
}

fn load_position(fen: &str, side: Option<Side>) -> Result<(Position, Color)> {
    let (pos, fen_side) = Position::from_fen(fen).with_context(|| format!("cannot parse position '{fen}'"))?;
    Ok((pos, side.map(Color::from).unwrap_or(fen_side)))
}

fn bestmove(config: &AppConfig, engine: Option<Arc<UciEngine>>, args: BestmoveArgs) -> Result<()> {
    let (pos, side) = load_position(&args.fen, args.side)?;
    let mut decider = make_decider(config, engine.as_ref(), side, None);
    let decision = decider.decide(&pos, &CancelToken::new())?;

    if args.json {
        let report = DecisionReport::new(&decision, side, None, pos.to_fen(side));
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("bestmove {}", decision.token);
        if let Some(rationale) = &decision.rationale {
            println!("info string {rationale}");
        }
    }
    Ok(())
}

fn recommend(config: &AppConfig, engine: Option<Arc<UciEngine>>, args: RecommendArgs) -> Result<()> {
    let (pos, side) = load_position(&args.fen, args.side)?;
    let decider = make_decider(config, engine.as_ref(), side, None);
    let recs = decider.recommend(&pos, side, args.count, &CancelToken::new());
    if recs.is_empty() {
        bail!("{side} has no legal move");
    }
    for rec in recs {
        println!("{}. {} ({})", rec.rank, rec.description, rec.token);
    }
    Ok(())
}

fn selfplay(config: &AppConfig, engine: Option<Arc<UciEngine>>, args: SelfplayArgs) -> Result<()> {
    let (mut pos, mut side) = load_position(&args.fen, None)?;
    let mut red = make_decider(config, engine.as_ref(), Color::Red, args.seed);
    let mut black = make_decider(config, engine.as_ref(), Color::Black, args.seed);
    let cancel = CancelToken::new();

    for ply in 1..=args.plies {
        let state = pos.game_state(side);
        if state.is_terminal() {
            println!("game over after {} plies: {side} {state:?}", ply - 1);
            return Ok(());
        }
        let decider = match side {
            Color::Red => &mut red,
            Color::Black => &mut black,
        };
        let decision = match decider.decide(&pos, &cancel) {
            Ok(d) => d,
            Err(DecisionError::NoLegalMove { side }) => {
                println!("{side} has no legal move after {} plies ({:?})", ply - 1, pos.game_state(side));
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        pos.apply_move(decision.mv);
        if args.json {
            let report = DecisionReport::new(&decision, side, Some(ply), pos.to_fen(side.opponent()));
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{ply:>3}. {side:<5} {} [{}]", decision.token, decision.source);
        }
        side = side.opponent();
    }
    println!("{}", pos.to_fen(side));
    Ok(())
}
