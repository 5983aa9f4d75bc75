//! Typed errors surfaced by the library.
//!
//! Row-level CSV problems are not errors here: they are reported as
//! [`RejectedRow`](crate::parser::RejectedRow) diagnostics by the parser.

use thiserror::Error;

/// Failure to retrieve the raw CSV text for a refresh cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to load or validate a [`PipelineConfig`](crate::config::PipelineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure to interpret a selector value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown time range '{0}' (expected daily, weekly or monthly)")]
    UnknownRange(String),

    #[error("unrecognised selector command '{0}' (expected `city <name>` or `range <tag>`)")]
    UnknownCommand(String),
}
