//! Error types for job manager operations.

use exauq_hardware::HardwareError;
use exauq_log::LogError;
use exauq_types::{Job, ValidationError};
use thiserror::Error;

/// Error types for job manager operations.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Input rejected before any side effect.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Simulations log failure.
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// Hardware backend failure.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// The manager no longer accepts submissions.
    #[error("Job manager has been shut down")]
    ShutDown,

    /// A background task panicked or was aborted.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ManagerError {
    /// Whether this is a log error that retrying cannot fix.
    #[must_use]
    pub fn is_permanent_log_error(&self) -> bool {
        matches!(self, Self::Log(error) if error.is_permanent())
    }
}

/// A batch submission that stopped early.
///
/// Jobs accepted before the failure are recorded in the log and monitored.
#[derive(Error, Debug)]
#[error("Batch stopped after {} submitted job(s): {source}", .submitted.len())]
pub struct BatchError {
    /// Jobs accepted before the failure, in input order.
    pub submitted: Vec<Job>,
    /// Why the batch stopped.
    #[source]
    pub source: ManagerError,
}

/// Result alias for job manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;
