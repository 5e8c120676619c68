//! Error types for the anomaly scoring client.
//!
//! Two families are kept apart on purpose: [`Error`] ends a run, while
//! [`RowParseError`] only ever describes a single rejected input row and
//! is reported through the ingestion report and `badrecords.log`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level (fatal) error types
#[derive(Debug, Error)]
pub enum Error {
    /// Input source could not be opened or read
    #[error("Input error: {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network or connection failure while talking to the scoring service
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Scoring service answered with a non-success status
    #[error("Service error: status {status}\nheaders:\n{headers}\nbody:\n{body}")]
    Service {
        status: u16,
        headers: String,
        body: String,
    },

    /// Response envelope did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Writing an output artifact failed
    #[error("Write error: {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plot artifact was not valid base64
    #[error("Image decode error: {0}")]
    Image(#[from] base64::DecodeError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure happened before the scoring service produced
    /// anything usable (nothing may be written for such errors).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Service { .. } | Error::Decode(_)
        )
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// A single input row that could not be turned into a (timestamp, value) pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct RowParseError {
    /// 1-based line number in the source
    pub line: u64,
    /// Row text exactly as it appeared in the input, without the line terminator
    pub raw: String,
    pub kind: RowErrorKind,
}

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorKind {
    #[error("expected at least 2 fields, found {0}")]
    MissingField(usize),

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid value {0:?}")]
    InvalidValue(String),
}
