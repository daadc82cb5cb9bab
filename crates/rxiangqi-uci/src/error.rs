use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine did not answer '{expected}' within {timeout:?}")]
    HandshakeTimeout {
        expected: &'static str,
        timeout: Duration,
    },

    #[error("engine process exited")]
    Exited,

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine is not available ({0})")]
    Unavailable(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
