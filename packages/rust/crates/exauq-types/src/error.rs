//! Validation errors for value construction.
//!
//! Raised synchronously to the caller and never retried.

use thiserror::Error;

/// Failure to construct a well-formed value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Job identifier is not a non-empty string of decimal digits.
    #[error("expected a job id consisting only of digits, but received '{0}'")]
    InvalidJobId(String),

    /// Input coordinate is NaN or infinite.
    #[error("input coordinate {index} is not a finite real number: {value}")]
    NonFiniteCoordinate {
        /// Zero-based coordinate position.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Input dimension does not agree with the configured dimension.
    #[error("expected an input of dimension {expected}, but received dimension {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Dimension of the supplied input.
        actual: usize,
    },

    /// Text does not name a known job status.
    #[error("unknown job status '{0}'")]
    UnknownStatus(String),
}
