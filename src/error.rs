//! Error types for parsing, configuration and translation.
//!
//! Parse errors are per-line and recoverable; configuration and translation
//! errors abort the run before anything is written.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Mode;

/// A problem with a single source line.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A word whose value is not a number, e.g. `X1..2` or a bare `G`.
    #[error("line {line}: malformed number in '{token}'")]
    MalformedNumber { line: usize, token: String },

    /// Content that is not a word, a comment or whitespace.
    #[error("line {line}: unrecognized statement '{text}'")]
    Structure { line: usize, text: String },

    /// The source could not be read past this line.
    #[error("line {line}: failed to read source")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    /// Source line the error refers to (1-based).
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedNumber { line, .. }
            | ParseError::Structure { line, .. }
            | ParseError::Read { line, .. } => *line,
        }
    }
}

/// A configuration value that cannot be used for translation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown mode '{0}' (expected one of FDM, Metal, LaserCut)")]
    UnknownMode(String),

    #[error("unknown axis '{0}' (expected X, Y or Z)")]
    UnknownAxis(String),

    #[error("{name} must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        requirement: &'static str,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML in {}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that abort a translation run.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The selected mode has no mapping for a parsed command.
    #[error("line {line}: '{code}' is not supported in {mode} mode")]
    UnsupportedCommand { line: usize, code: String, mode: Mode },

    /// A parse error in strict mode.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl TranslateError {
    /// Source line the error refers to, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            TranslateError::UnsupportedCommand { line, .. } => Some(*line),
            TranslateError::Parse(err) => Some(err.line()),
            TranslateError::Configuration(_) => None,
        }
    }
}
