//! Operational error type.
//!
//! Programmer errors (duplicate names, empty name segments, zero timer
//! capacity) panic at the point of misuse and never show up here.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatError>;

/// Recoverable failures: bad configuration, I/O while writing outputs,
/// snapshots that cannot be encoded.
#[derive(Debug, Error)]
pub enum StatError {
    #[error("unknown producer kind: {0}")]
    UnknownProducer(String),
    #[error("unknown format kind: {0}")]
    UnknownFormat(String),
    #[error("producer `{producer}` requires argument `{arg}`")]
    MissingArg { producer: String, arg: String },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("snapshot scheduler requires a running tokio runtime")]
    NoRuntime,
    #[error("encode: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
