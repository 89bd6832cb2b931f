//! Capability interface over a compute resource.

use async_trait::async_trait;
use exauq_types::{Input, JobId, JobStatus};

use crate::error::{HardwareError, Result};

/// A resource that runs simulation jobs.
///
/// Implementations may block on slow remote calls; callers must not hold
/// locks across these methods.
#[async_trait]
pub trait HardwareInterface: Send + Sync {
    /// Submit a job for `input` and return the backend-assigned id.
    async fn submit_job(&self, input: &Input) -> Result<JobId>;

    /// Current status of a job. Non-terminal states mean "still running".
    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatus>;

    /// Output of a completed job.
    async fn get_job_output(&self, job_id: &JobId) -> Result<f64>;

    /// Cancel a job. Backends that cannot cancel keep this default.
    async fn cancel_job(&self, job_id: &JobId) -> Result<()> {
        let _ = job_id;
        Err(HardwareError::Unsupported("cancel_job"))
    }
}

/// Parse the simulator output from process text: the last non-empty line
/// must be a real number.
pub(crate) fn parse_output_text(text: &str) -> std::result::Result<f64, String> {
    let line = text
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .ok_or_else(|| "no output produced".to_string())?;
    line.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("last output line is not a real number: '{line}'"))
}
