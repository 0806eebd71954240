use thiserror::Error;

use crate::session::Difficulty;

/// Errors surfaced by the session controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("no text available for this session")]
    NoTextAvailable,

    #[error("invalid session configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Rejected configuration values, caught when a session config is built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("session duration must be greater than zero")]
    ZeroDuration,

    #[error("countdown of {0}s exceeds the {max}s limit", max = crate::session::MAX_COUNTDOWN_SECS)]
    CountdownTooLong(u32),

    #[error("custom text is empty")]
    EmptyCustomText,

    #[error("difficulty {0} cannot be used to start a session")]
    UnsupportedDifficulty(Difficulty),
}

#[derive(Error, Debug)]
pub enum TextError {
    #[error("no corpus bundled for difficulty {0}")]
    MissingCorpus(Difficulty),

    #[error("corpus for {0} has no passages")]
    EmptyCorpus(Difficulty),

    #[error("failed to parse corpus: {0}")]
    Corpus(#[from] serde_json::Error),

    #[error("text provider returned an empty passage")]
    EmptyText,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is malformed: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
