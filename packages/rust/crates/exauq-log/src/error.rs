//! Error types for simulations log operations.
//!
//! Library crates use `thiserror` for explicit error enums.

use std::path::PathBuf;

use exauq_types::{JobId, ValidationError};
use thiserror::Error;

/// Error types for simulations log operations.
#[derive(Error, Debug)]
pub enum LogError {
    /// Value handed to the log is malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Existing log file does not carry the required columns.
    #[error("Malformed header in {}: {reason}", path.display())]
    MalformedHeader {
        /// Log file path.
        path: PathBuf,
        /// What is wrong with the header.
        reason: String,
    },

    /// Data row cannot be parsed back into a record.
    #[error("Malformed record at data row {row}: {reason}")]
    MalformedRecord {
        /// 1-based data row number (the header is not counted).
        row: usize,
        /// What is wrong with the row.
        reason: String,
    },

    /// No record carries the job id.
    #[error("Could not add output to simulation with job ID {0}: no such simulation exists")]
    Lookup(JobId),

    /// A different output was already recorded for the job id.
    #[error("Output for job ID {job_id} is already recorded as {existing}; refusing to replace it with {new}")]
    OutputConflict {
        /// Job whose output was already written.
        job_id: JobId,
        /// Output already in the log.
        existing: f64,
        /// Rejected output.
        new: f64,
    },

    /// CSV encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Low-level I/O error from std::io.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Replacing the log file with its updated copy failed.
    #[error("Failed to replace log file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl LogError {
    /// Whether retrying the same call cannot succeed.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::MalformedHeader { .. }
                | Self::MalformedRecord { .. }
                | Self::Lookup(_)
                | Self::OutputConflict { .. }
        )
    }
}
