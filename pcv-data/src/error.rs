//! Error types for ingestion, configuration and persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling a line template.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("template `{template}` is missing required field {{{field}}}")]
    MissingField { template: String, field: &'static str },

    #[error("template `{template}` uses field {{{field}}} more than once")]
    DuplicateField { template: String, field: &'static str },

    #[error("template `{template}` does not compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while turning one line of text into a point.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no match")]
    NoMatch,

    #[error("missing required field {{{0}}}")]
    MissingCoordinate(&'static str),

    #[error("invalid value `{value}` for field {{{field}}}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("secondary offset needs all of {{X}}, {{Y}}, {{Z}}")]
    SecondaryOffsetIncomplete,
}

/// Errors raised while streaming points out of a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("invalid pattern for source {}: {source}", path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: PatternError,
    },

    #[error("failed to parse line ({}:{line}): {source}", path.display())]
    Line {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ingestion cancelled")]
    Cancelled,
}

impl LoadError {
    /// Whether ingestion may skip this error and continue with the next source.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LoadError::SourceNotFound { .. })
    }
}

/// Errors raised while reading the JSON configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config root must be an object")]
    NotAnObject,

    #[error("config is missing key `{0}`")]
    MissingKey(&'static str),

    #[error("config key `{key}` must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("failed to build config n°{index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the `--only` selection mini-language.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid selection token(s): {}", .0.join(", "))]
    InvalidTokens(Vec<String>),
}

/// Errors raised when configuring the sampler.
#[derive(Debug, Error, PartialEq)]
pub enum SampleError {
    #[error("invalid sampling fraction {0} (should be > 0 and <= 1)")]
    InvalidFraction(f64),

    #[error("invalid voxel size {0} (should be > 0)")]
    InvalidVoxelSize(f64),
}

/// Errors raised while persisting a flattened cloud.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save worker panicked")]
    WorkerPanicked,
}
