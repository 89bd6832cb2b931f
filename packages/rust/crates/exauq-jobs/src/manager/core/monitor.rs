use std::collections::HashMap;
use std::sync::Arc;

use exauq_types::{JobId, JobStatus};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::manager::types::MonitorPhase;

use super::JobManager;

/// What one poll learned about a job.
enum PollOutcome {
    /// Still queued or running.
    Pending,
    /// Output recorded, or the job ended without one.
    Settled,
}

impl JobManager {
    pub(super) fn spawn_monitor(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.run_monitor().await })
    }

    async fn run_monitor(self: Arc<Self>) {
        tracing::info!(
            interval_ms = u64::try_from(self.polling_interval.as_millis()).unwrap_or(u64::MAX),
            "job monitor started"
        );
        let mut failures: HashMap<JobId, u32> = HashMap::new();
        loop {
            if !self.shutdown.is_cancelled() {
                self.poll_pass(&mut failures).await;
            }
            if self.stop_if_done().await {
                break;
            }
            tokio::select! {
                () = self.shutdown.cancelled() => {}
                () = tokio::time::sleep(self.polling_interval) => {}
            }
        }
    }

    /// Flip to idle when there is nothing left to poll or shutdown was
    /// requested. The check and the flip happen under one lock so a
    /// concurrent `submit` either sees the monitor running or starts a new
    /// one.
    async fn stop_if_done(&self) -> bool {
        let mut state = self.state.lock().await;
        let cancelled = self.shutdown.is_cancelled();
        if !cancelled && !state.pending.is_empty() {
            tracing::debug!(pending = state.pending.len(), "jobs still pending");
            return false;
        }
        state.running = false;
        self.phase_tx.send_replace(MonitorPhase::Idle);
        if cancelled {
            tracing::info!(pending = state.pending.len(), "job monitor stopped by shutdown");
        } else {
            tracing::info!("all pending jobs reconciled; job monitor stopped");
        }
        true
    }

    async fn poll_pass(&self, failures: &mut HashMap<JobId, u32>) {
        let snapshot = self.state.lock().await.pending.clone();
        for job_id in snapshot {
            match self.poll_job(&job_id).await {
                Ok(PollOutcome::Pending) => {
                    failures.remove(&job_id);
                }
                Ok(PollOutcome::Settled) => {
                    failures.remove(&job_id);
                    self.state.lock().await.remove_pending(&job_id);
                }
                Err(error) if error.is_permanent_log_error() => {
                    tracing::error!(job_id = %job_id, error = %error, "cannot record job output; no longer monitoring job");
                    failures.remove(&job_id);
                    self.state.lock().await.remove_pending(&job_id);
                }
                Err(error) => {
                    let count = failures.entry(job_id.clone()).or_default();
                    *count += 1;
                    if *count >= self.max_poll_failures {
                        tracing::error!(
                            job_id = %job_id,
                            failures = *count,
                            error = %error,
                            "giving up on job after repeated poll failures; it stays pending in the log"
                        );
                        failures.remove(&job_id);
                        self.state.lock().await.remove_pending(&job_id);
                    } else {
                        tracing::warn!(
                            job_id = %job_id,
                            failures = *count,
                            max = self.max_poll_failures,
                            error = %error,
                            "failed to poll job; will retry"
                        );
                    }
                }
            }
        }
    }

    async fn poll_job(&self, job_id: &JobId) -> Result<PollOutcome> {
        let status = self.interface.get_job_status(job_id).await?;
        match status {
            JobStatus::Completed => {
                let output = self.interface.get_job_output(job_id).await?;
                let record_id = job_id.clone();
                self.with_log(move |log| log.record_result(&record_id, output))
                    .await?;
                tracing::info!(job_id = %job_id, output, "recorded simulation output");
                Ok(PollOutcome::Settled)
            }
            status if status.is_terminal() => {
                tracing::warn!(job_id = %job_id, status = %status, "job ended without an output");
                Ok(PollOutcome::Settled)
            }
            status => {
                tracing::debug!(job_id = %job_id, status = %status, "job not finished");
                Ok(PollOutcome::Pending)
            }
        }
    }
}
