//! Error taxonomy for the analyzer
//!
//! Fatal conditions abort a run before any report is produced and map onto the
//! CLI exit-status contract through [`AnalyzerError::exit_code`]. Per-line
//! failures live in [`crate::parser::ParseError`] and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Shared `Result` alias for fallible analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The input could not be opened.
    #[error("cannot open log file {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input was opened but a read failed part way through.
    #[error("failed reading {path} at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// Invalid filter bounds, limits or configuration values.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalyzerError {
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }

    /// Process exit status for the CLI wrapper.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Input { .. } | Self::Read { .. } => 1,
            Self::Config(_) => 2,
        }
    }

    pub const fn is_fatal_input(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::Read { .. })
    }
}
