//! Slurm cluster backend driven through `sbatch`, `squeue` and `scancel`.
//!
//! Each job runs `script <coord_1> ... <coord_n>`; its stdout goes to
//! `<output_dir>/exauq-<jobid>.out`, whose last non-empty line is the
//! simulator output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use exauq_types::{Input, JobId, JobStatus, format_real};
use regex::Regex;
use tokio::process::Command;

use crate::error::{HardwareError, Result};
use crate::interface::{HardwareInterface, parse_output_text};

const INVALID_JOB_ID: &str = "Invalid job id specified";

/// Configuration for the Slurm backend.
#[derive(Debug, Clone)]
pub struct SlurmConfig {
    /// Batch script wrapping the simulator.
    pub script: PathBuf,
    /// Directory receiving per-job output files.
    pub output_dir: PathBuf,
    /// Extra `sbatch` arguments (account, partition, walltime, ...).
    pub sbatch_args: Vec<String>,
    /// `sbatch` executable.
    pub sbatch: String,
    /// `squeue` executable.
    pub squeue: String,
    /// `scancel` executable.
    pub scancel: String,
    /// Attempts per scheduler command before giving up.
    pub num_retries: usize,
    /// Delay between attempts.
    pub retry_delay: Duration,
}

impl SlurmConfig {
    /// Defaults for the standard Slurm executables on `PATH`.
    pub fn new(script: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            output_dir: output_dir.into(),
            sbatch_args: Vec::new(),
            sbatch: "sbatch".to_string(),
            squeue: "squeue".to_string(),
            scancel: "scancel".to_string(),
            num_retries: 3,
            retry_delay: Duration::from_secs(10),
        }
    }
}

/// Submits jobs to a Slurm cluster.
#[derive(Debug)]
pub struct SlurmInterface {
    config: SlurmConfig,
    job_id_regex: Regex,
}

struct CommandOutput {
    code: i32,
    stdout: String,
    stderr: String,
}

impl SlurmInterface {
    /// Create a Slurm backend.
    pub fn new(config: SlurmConfig) -> Result<Self> {
        let job_id_regex = Regex::new(r"^\s*(\d+)")
            .map_err(|error| HardwareError::Backend(error.to_string()))?;
        Ok(Self {
            config,
            job_id_regex,
        })
    }

    /// Path of the output file for `job_id`.
    #[must_use]
    pub fn output_path(&self, job_id: &JobId) -> PathBuf {
        self.config.output_dir.join(format!("exauq-{job_id}.out"))
    }

    /// Map a Slurm job state onto a job status; `None` means the job left the
    /// queue and its output file decides.
    fn map_state(state: &str) -> Option<JobStatus> {
        let state = state.split_whitespace().next().unwrap_or_default();
        match state {
            "" | "COMPLETED" => None,
            "PENDING" | "CONFIGURING" | "REQUEUED" | "SUSPENDED" | "RESV_DEL_HOLD" => {
                Some(JobStatus::Submitted)
            }
            "RUNNING" | "COMPLETING" | "STAGE_OUT" => Some(JobStatus::Running),
            "CANCELLED" => Some(JobStatus::Cancelled),
            "FAILED" | "TIMEOUT" | "NODE_FAIL" | "OUT_OF_MEMORY" | "BOOT_FAIL" | "DEADLINE"
            | "PREEMPTED" => Some(JobStatus::Failed),
            other => {
                tracing::debug!(state = other, "unrecognised slurm state; treating as running");
                Some(JobStatus::Running)
            }
        }
    }

    /// Run a scheduler command, retrying transient failures.
    async fn run_command(
        &self,
        program: &str,
        args: &[String],
        ignore_errors: &[&str],
    ) -> Result<CommandOutput> {
        let attempts = self.config.num_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::trace!(program, ?args, attempt, "running scheduler command");
            let output = Command::new(program)
                .args(args)
                .output()
                .await
                .map_err(|source| HardwareError::Spawn {
                    program: program.to_string(),
                    source,
                })?;
            let result = CommandOutput {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            };

            let ignorable = ignore_errors
                .iter()
                .any(|text| result.stderr.contains(text) || result.stdout.contains(text));
            if result.code == 0 || ignorable {
                return Ok(result);
            }
            if attempt >= attempts {
                return Err(HardwareError::Command {
                    program: program.to_string(),
                    code: result.code,
                    stderr: result.stderr.trim().to_string(),
                });
            }
            tracing::warn!(
                program,
                attempt,
                attempts,
                code = result.code,
                stderr = %result.stderr.trim(),
                "scheduler command failed; retrying"
            );
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    async fn read_output(&self, job_id: &JobId) -> Result<f64> {
        let path = self.output_path(job_id);
        let text = read_to_string_if_exists(&path).await?;
        match text.as_deref().map(parse_output_text) {
            Some(Ok(output)) => Ok(output),
            Some(Err(reason)) => {
                tracing::debug!(job_id = %job_id, reason, "slurm output file has no result");
                Err(HardwareError::OutputUnavailable(job_id.clone()))
            }
            None => Err(HardwareError::OutputUnavailable(job_id.clone())),
        }
    }
}

async fn read_to_string_if_exists(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

#[async_trait]
impl HardwareInterface for SlurmInterface {
    async fn submit_job(&self, input: &Input) -> Result<JobId> {
        let output_pattern = self.config.output_dir.join("exauq-%j.out");
        let mut args = vec![
            "--parsable".to_string(),
            "--output".to_string(),
            output_pattern.to_string_lossy().to_string(),
        ];
        args.extend(self.config.sbatch_args.iter().cloned());
        args.push(self.config.script.to_string_lossy().to_string());
        args.extend(input.iter().map(format_real));

        let output = self.run_command(&self.config.sbatch, &args, &[]).await?;
        let captures = self
            .job_id_regex
            .captures(&output.stdout)
            .ok_or_else(|| {
                HardwareError::UnexpectedResponse(format!(
                    "sbatch did not report a job id: '{}'",
                    output.stdout.trim()
                ))
            })?;
        let job_id = JobId::new(&captures[1])?;
        tracing::info!(job_id = %job_id, "submitted slurm job");
        Ok(job_id)
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        let args = [
            "-h".to_string(),
            "-j".to_string(),
            job_id.to_string(),
            "-o".to_string(),
            "%T".to_string(),
        ];
        let output = self
            .run_command(&self.config.squeue, &args, &[INVALID_JOB_ID])
            .await?;
        let state = if output.code == 0 {
            output.stdout.trim().to_string()
        } else {
            String::new()
        };
        if let Some(status) = Self::map_state(&state) {
            return Ok(status);
        }

        match self.read_output(job_id).await {
            Ok(_) => Ok(JobStatus::Completed),
            Err(HardwareError::OutputUnavailable(_)) => Ok(JobStatus::Failed),
            Err(error) => Err(error),
        }
    }

    async fn get_job_output(&self, job_id: &JobId) -> Result<f64> {
        self.read_output(job_id).await
    }

    async fn cancel_job(&self, job_id: &JobId) -> Result<()> {
        self.run_command(&self.config.scancel, &[job_id.to_string()], &[])
            .await?;
        tracing::info!(job_id = %job_id, "cancelled slurm job");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_state_covers_queue_states() {
        assert_eq!(
            SlurmInterface::map_state("PENDING"),
            Some(JobStatus::Submitted)
        );
        assert_eq!(
            SlurmInterface::map_state("RUNNING\n"),
            Some(JobStatus::Running)
        );
        assert_eq!(
            SlurmInterface::map_state("CANCELLED by 1000"),
            Some(JobStatus::Cancelled)
        );
        assert_eq!(
            SlurmInterface::map_state("TIMEOUT"),
            Some(JobStatus::Failed)
        );
        assert_eq!(SlurmInterface::map_state(""), None);
        assert_eq!(SlurmInterface::map_state("COMPLETED"), None);
    }

    #[test]
    fn output_path_names_job() {
        let slurm =
            SlurmInterface::new(SlurmConfig::new("run.sh", "/scratch/out")).unwrap();
        assert_eq!(
            slurm.output_path(&JobId::from(12)),
            PathBuf::from("/scratch/out/exauq-12.out")
        );
    }
}
