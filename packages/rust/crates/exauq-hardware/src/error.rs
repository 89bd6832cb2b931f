//! Error types for hardware backends.
//!
//! Explicit error enums with context.

use exauq_types::{JobId, ValidationError};
use thiserror::Error;

/// Hardware-backend errors.
#[derive(Error, Debug)]
pub enum HardwareError {
    /// Process could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// External command returned a non-zero exit code.
    #[error("Command '{program}' failed (exit {code}): {stderr}")]
    Command {
        /// Command that failed.
        program: String,
        /// Exit code, `-1` when killed by a signal.
        code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP endpoint answered with a non-success status.
    #[error("HTTP status {status} from {url}: {body}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Requested URL.
        url: String,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Backend answered with something that cannot be interpreted.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Backend does not know the job.
    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    /// Output requested for a job that has none.
    #[error("No output available for job {0}")]
    OutputUnavailable(JobId),

    /// Operation not offered by this backend.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Low-level I/O error from std::io.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Value returned by the backend is malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Backend-specific failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;
