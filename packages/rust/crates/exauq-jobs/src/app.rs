//! Application facade: open a log, start a manager, submit and query jobs.

use std::path::PathBuf;
use std::sync::Arc;

use exauq_hardware::HardwareInterface;
use exauq_log::{SimulationRecord, SimulationsLog};
use exauq_types::{Input, Job, JobId, JobStatus};

use crate::error::{BatchError, Result};
use crate::manager::{JobManager, JobManagerConfig};
use crate::simulator::Simulator;

/// Entry point bundling a simulations log and its job manager.
#[derive(Debug)]
pub struct App {
    manager: Arc<JobManager>,
}

impl App {
    /// Open (or create) the log at `log_path` and start a manager on it.
    pub async fn start(
        interface: Arc<dyn HardwareInterface>,
        input_dim: usize,
        log_path: impl Into<PathBuf>,
        config: JobManagerConfig,
    ) -> Result<Self> {
        let log_path = log_path.into();
        let log =
            tokio::task::spawn_blocking(move || SimulationsLog::open(log_path, input_dim)).await??;
        Self::with_log(log, interface, config).await
    }

    /// Start a manager on an already opened log.
    pub async fn with_log(
        log: SimulationsLog,
        interface: Arc<dyn HardwareInterface>,
        config: JobManagerConfig,
    ) -> Result<Self> {
        let manager = JobManager::start(Arc::new(log), interface, config).await?;
        Ok(Self { manager })
    }

    /// Submit a batch of inputs in order, stopping at the first failure.
    ///
    /// On failure the error carries the jobs already submitted.
    pub async fn submit(&self, inputs: &[Vec<f64>]) -> std::result::Result<Vec<Job>, BatchError> {
        let mut jobs = Vec::with_capacity(inputs.len());
        for coords in inputs {
            let submitted = match Input::new(coords.clone()) {
                Ok(input) => self.manager.submit(input).await,
                Err(error) => Err(error.into()),
            };
            match submitted {
                Ok(job) => jobs.push(job),
                Err(source) => {
                    return Err(BatchError {
                        submitted: jobs,
                        source,
                    });
                }
            }
        }
        Ok(jobs)
    }

    /// Log records, optionally filtered by job id and by status.
    pub async fn get_jobs(
        &self,
        job_ids: Option<Vec<JobId>>,
        statuses: Option<Vec<JobStatus>>,
    ) -> Result<Vec<SimulationRecord>> {
        self.manager
            .with_log(move |log| log.get_records(job_ids.as_deref(), statuses.as_deref()))
            .await
    }

    /// Memoising simulator over the same manager.
    #[must_use]
    pub fn simulator(&self) -> Simulator {
        Simulator::new(Arc::clone(&self.manager))
    }

    /// Underlying job manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<JobManager> {
        &self.manager
    }

    /// Stop the manager; see [`JobManager::shutdown`].
    pub async fn shutdown(&self) -> Result<()> {
        self.manager.shutdown().await
    }
}
