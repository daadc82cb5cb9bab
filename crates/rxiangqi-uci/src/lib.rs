//! Adapter for external UCI xiangqi engines (Pikafish, Fairy-Stockfish)
//!
//! [`UciEngine`] owns one engine subprocess and exposes blocking, time-bounded
//! requests. Lines are exchanged through [`protocol`]; the subprocess plumbing
//! lives in [`process`].

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod process;
pub mod protocol;

pub use client::EngineClient;
pub use config::EngineConfig;
pub use engine::{EngineState, EngineStatus, SearchOutcome, UciEngine, search_depth_for};
pub use error::EngineError;
pub use protocol::{EngineEvent, InfoLine, Score, UciCommand, parse_line};
