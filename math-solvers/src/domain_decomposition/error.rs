//! Error types for domain decomposition.
//!
//! Every error aborts the current solve attempt. Callers may retry with a
//! different partition.

use thiserror::Error;

/// Errors raised while partitioning, building subdomains or sweeping.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchwarzError {
    /// Invalid region count, overlap, tolerance or sweep bound.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Shapes of the global matrix, vectors, restrictions or local matrices disagree.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    Dimension {
        /// Which operand was checked
        context: String,
        /// The size implied by the other operands
        expected: usize,
        /// The size that was found
        actual: usize,
    },

    /// A local system could not be factorized or solved.
    #[error("local solve failed in region {region} ({name}): {reason}")]
    SubdomainSolve {
        /// Position of the region in the processing order
        region: usize,
        /// Name of the region
        name: String,
        /// Underlying failure
        reason: String,
    },
}

/// A specialized `Result` type for domain decomposition.
pub type Result<T> = std::result::Result<T, SchwarzError>;

impl SchwarzError {
    pub(crate) fn dimension(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        SchwarzError::Dimension {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SchwarzError::Configuration(_))
    }

    /// Returns `true` if this is a shape mismatch.
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, SchwarzError::Dimension { .. })
    }

    /// Returns the failing region index for local solve errors.
    pub fn failed_region(&self) -> Option<usize> {
        match self {
            SchwarzError::SubdomainSolve { region, .. } => Some(*region),
            _ => None,
        }
    }
}
