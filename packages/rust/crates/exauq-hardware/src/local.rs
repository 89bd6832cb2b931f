//! Local process backend: one child process per job.
//!
//! The simulator is invoked as `program args... <coord_1> ... <coord_n>` and
//! must print its output as the last non-empty line of stdout.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use exauq_types::{Input, JobId, JobStatus, format_real};
use tokio::process::Command;
use tokio::task::AbortHandle;

use crate::error::{HardwareError, Result};
use crate::interface::{HardwareInterface, parse_output_text};

/// Configuration for the local process backend.
#[derive(Debug, Clone)]
pub struct LocalProcessConfig {
    /// Simulator executable.
    pub program: String,
    /// Arguments placed before the input coordinates.
    pub args: Vec<String>,
    /// Working directory for the child; inherits the current one when `None`.
    pub working_dir: Option<PathBuf>,
    /// Per-job wall-clock limit; a job exceeding it is killed and failed.
    pub job_timeout: Option<Duration>,
}

impl LocalProcessConfig {
    /// Run `program` with no extra arguments and no timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            job_timeout: None,
        }
    }
}

#[derive(Debug)]
struct LocalJob {
    status: JobStatus,
    output: Option<f64>,
    error: Option<String>,
    abort: Option<AbortHandle>,
}

type JobTable = Arc<Mutex<HashMap<JobId, LocalJob>>>;

/// Runs each job as a child process of the current process.
#[derive(Debug)]
pub struct LocalProcessInterface {
    config: LocalProcessConfig,
    next_id: AtomicU64,
    jobs: JobTable,
}

impl LocalProcessInterface {
    /// Create a backend with job ids starting at 1.
    #[must_use]
    pub fn new(config: LocalProcessConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number the next submitted job `first` (at least 1).
    ///
    /// Ids are only unique within one instance, so a process reusing a
    /// simulations log must start above the ids already recorded there.
    #[must_use]
    pub fn with_first_id(self, first: u64) -> Self {
        self.next_id.store(first.max(1), Ordering::Relaxed);
        self
    }

    /// Error text of a failed job, if any.
    pub fn job_error(&self, job_id: &JobId) -> Option<String> {
        lock(&self.jobs).get(job_id).and_then(|job| job.error.clone())
    }

    fn command(&self, input: &Input) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .args(input.iter().map(format_real))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

fn lock(jobs: &JobTable) -> MutexGuard<'_, HashMap<JobId, LocalJob>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

fn finish(jobs: &JobTable, job_id: &JobId, outcome: std::result::Result<f64, String>) {
    let mut table = lock(jobs);
    let Some(job) = table.get_mut(job_id) else {
        return;
    };
    if job.status.is_terminal() {
        return;
    }
    match outcome {
        Ok(output) => {
            tracing::debug!(job_id = %job_id, output, "local simulation completed");
            job.status = JobStatus::Completed;
            job.output = Some(output);
        }
        Err(error) => {
            tracing::warn!(job_id = %job_id, error = %error, "local simulation failed");
            job.status = JobStatus::Failed;
            job.error = Some(error);
        }
    }
    job.abort = None;
}

#[async_trait]
impl HardwareInterface for LocalProcessInterface {
    async fn submit_job(&self, input: &Input) -> Result<JobId> {
        let child = self
            .command(input)
            .spawn()
            .map_err(|source| HardwareError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;
        let job_id = JobId::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.jobs).insert(
            job_id.clone(),
            LocalJob {
                status: JobStatus::Running,
                output: None,
                error: None,
                abort: None,
            },
        );

        let jobs = Arc::clone(&self.jobs);
        let task_job_id = job_id.clone();
        let job_timeout = self.config.job_timeout;
        let handle = tokio::spawn(async move {
            let waited = match job_timeout {
                Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                    .await
                    .map_err(|_| format!("timed out after {}s", limit.as_secs_f64())),
                None => Ok(child.wait_with_output().await),
            };
            let outcome = match waited {
                Ok(Ok(output)) if output.status.success() => {
                    parse_output_text(&String::from_utf8_lossy(&output.stdout))
                }
                Ok(Ok(output)) => Err(format!(
                    "exit {}: {}",
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr).trim()
                )),
                Ok(Err(error)) => Err(error.to_string()),
                Err(timed_out) => Err(timed_out),
            };
            finish(&jobs, &task_job_id, outcome);
        });

        if let Some(job) = lock(&self.jobs).get_mut(&job_id)
            && !job.status.is_terminal()
        {
            job.abort = Some(handle.abort_handle());
        }
        tracing::debug!(job_id = %job_id, program = %self.config.program, "started local simulation");
        Ok(job_id)
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        lock(&self.jobs)
            .get(job_id)
            .map(|job| job.status)
            .ok_or_else(|| HardwareError::UnknownJob(job_id.clone()))
    }

    async fn get_job_output(&self, job_id: &JobId) -> Result<f64> {
        let table = lock(&self.jobs);
        let job = table
            .get(job_id)
            .ok_or_else(|| HardwareError::UnknownJob(job_id.clone()))?;
        job.output
            .ok_or_else(|| HardwareError::OutputUnavailable(job_id.clone()))
    }

    async fn cancel_job(&self, job_id: &JobId) -> Result<()> {
        let mut table = lock(&self.jobs);
        let job = table
            .get_mut(job_id)
            .ok_or_else(|| HardwareError::UnknownJob(job_id.clone()))?;
        if job.status.is_terminal() {
            return Ok(());
        }
        if let Some(abort) = job.abort.take() {
            abort.abort();
        }
        job.status = JobStatus::Cancelled;
        tracing::info!(job_id = %job_id, "cancelled local simulation");
        Ok(())
    }
}
