//! Error types
//!
//! Expected conditions (empty text, weak signal, short chunks, stale results)
//! are reported through reason codes, not errors. These enums cover the rest.

use thiserror::Error;

/// Configuration loading / validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid crisis pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Check-in session lifecycle failures
#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("A check-in session is already active ({0})")]
    AlreadyActive(String),
    #[error("No active check-in session")]
    NoActiveSession,
    #[error("Session id mismatch: expected {expected}, got {got}")]
    SessionMismatch { expected: String, got: String },
    #[error("Speech recognition unavailable: {0}")]
    SpeechUnavailable(String),
    #[error("Transcript is empty, nothing to save")]
    EmptyTranscript,
}
