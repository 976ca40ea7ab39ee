use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading a SMILES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SMILES at position {position}: {message}")]
pub struct SmilesError {
    /// Byte offset into the input where parsing stopped
    pub position: usize,
    /// What went wrong
    pub message: String,
}

impl SmilesError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Failure while compiling a SMARTS query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SMARTS `{pattern}` at position {position}: {message}")]
pub struct SmartsError {
    /// The full pattern text
    pub pattern: String,
    /// Byte offset into the pattern where parsing stopped
    pub position: usize,
    /// What went wrong
    pub message: String,
}

/// Errors surfaced by the library and the command line tools.
#[derive(Debug, Error)]
pub enum LigError {
    /// Reading or writing a file failed
    #[error("failed to access {path}: {source}")]
    Io {
        /// File or directory that was accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A SMILES string could not be parsed
    #[error(transparent)]
    Smiles(#[from] SmilesError),

    /// A SMARTS query could not be compiled
    #[error(transparent)]
    Smarts(#[from] SmartsError),

    /// A settings file is not valid TOML for [`crate::FilterSettings`]
    #[error("invalid settings file {path}: {source}")]
    Config {
        /// Settings file
        path: PathBuf,
        /// TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Building or writing a DataFrame failed
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    /// The rayon thread pool could not be created
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An input SMILES file is missing
    #[error("input file {0} does not exist")]
    MissingInput(PathBuf),

    /// More picks were requested than there are candidates
    #[error("cannot pick {pick_size} molecules from a pool of {pool_size}")]
    PickSize {
        /// Requested number of picks
        pick_size: usize,
        /// Number of candidates
        pool_size: usize,
    },

    /// A line of an alert file has too few tab separated fields
    #[error("malformed alert definition on line {line} of {path}")]
    AlertFile {
        /// Alert file
        path: PathBuf,
        /// One-based line number
        line: usize,
    },
}

impl LigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LigError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LigError>;
