use crate::fitness::Convention;
use std::io;

/// Errors produced by the engine and its host-side stores
#[derive(Debug, thiserror::Error)]
pub enum ClozeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The sentence has no word that can be masked; try another sentence.
    #[error("no maskable word in sentence")]
    NoCandidate,

    #[error("cannot compare {left} fitness with {right} fitness")]
    MixedConventions { left: Convention, right: Convention },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClozeError>;
