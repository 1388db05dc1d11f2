//! Error types for mesh generation, assembly and the Schwarz driver.

use solvers::SchwarzError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or solving a diffusion problem.
#[derive(Debug, Error)]
pub enum FemError {
    /// Mesh parameters are invalid.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// A problem parameter (coefficient, source) is invalid.
    #[error("invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A configuration or output file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A configuration file is not valid JSON for the expected schema.
    #[error("invalid configuration {path}: {source}")]
    Config {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// Serializing results failed.
    #[error("cannot serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Domain decomposition failed.
    #[error(transparent)]
    Schwarz(#[from] SchwarzError),

    /// The reference direct solve failed.
    #[error("direct solve failed: {0}")]
    DirectSolve(String),
}

/// A specialized `Result` type for FEM operations.
pub type Result<T> = std::result::Result<T, FemError>;

impl FemError {
    /// Returns `true` if this error comes from the domain decomposition.
    pub fn is_schwarz_error(&self) -> bool {
        matches!(self, FemError::Schwarz(_))
    }

    /// Returns `true` if this is a file access or parse error.
    pub fn is_io_error(&self) -> bool {
        matches!(self, FemError::Io { .. } | FemError::Config { .. })
    }
}
