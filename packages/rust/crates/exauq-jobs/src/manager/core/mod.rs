//! Core runtime for submitting and monitoring simulation jobs.

mod monitor;

use std::sync::Arc;
use std::time::Duration;

use exauq_hardware::HardwareInterface;
use exauq_log::{LogError, SimulationsLog};
use exauq_types::{Input, Job, JobId};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{ManagerError, Result};
use crate::manager::types::{JobManagerConfig, MonitorPhase, MonitorState};

/// Submits jobs to a hardware interface, records them in a simulations log
/// and monitors them until their outputs are written back.
pub struct JobManager {
    log: Arc<SimulationsLog>,
    interface: Arc<dyn HardwareInterface>,
    state: Mutex<MonitorState>,
    phase_tx: watch::Sender<MonitorPhase>,
    shutdown: CancellationToken,
    polling_interval: Duration,
    max_poll_failures: u32,
    shutdown_timeout: Option<Duration>,
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("log", &self.log.path())
            .field("phase", &self.phase())
            .field("polling_interval", &self.polling_interval)
            .finish_non_exhaustive()
    }
}

impl JobManager {
    /// Start the manager, resuming every job the log still lists as pending.
    ///
    /// With `config.wait_for_pending` this returns only after the recovered
    /// jobs have been reconciled.
    pub async fn start(
        log: Arc<SimulationsLog>,
        interface: Arc<dyn HardwareInterface>,
        config: JobManagerConfig,
    ) -> Result<Arc<Self>> {
        let (phase_tx, _) = watch::channel(MonitorPhase::Idle);
        let manager = Arc::new(Self {
            log,
            interface,
            state: Mutex::new(MonitorState::default()),
            phase_tx,
            shutdown: CancellationToken::new(),
            polling_interval: Duration::from_millis(config.polling_interval_ms.max(1)),
            max_poll_failures: config.max_poll_failures.max(1),
            shutdown_timeout: config.shutdown_timeout_secs.map(Duration::from_secs),
        });

        let recovered = manager.with_log(SimulationsLog::list_pending).await?;
        if !recovered.is_empty() {
            tracing::info!(
                pending = recovered.len(),
                log = %manager.log.path().display(),
                "resuming pending jobs from simulations log"
            );
        }
        {
            let mut state = manager.state.lock().await;
            for job_id in recovered {
                state.add_pending(job_id);
            }
            manager.ensure_monitor(&mut state);
        }

        if config.wait_for_pending {
            manager.wait_for_idle().await;
        }
        Ok(manager)
    }

    /// Submit one simulation.
    ///
    /// The attempt is recorded in the log whatever the hardware answers: a
    /// rejected submission is logged with a blank job id and then reported
    /// as [`ManagerError::Hardware`].
    pub async fn submit(self: &Arc<Self>, input: Input) -> Result<Job> {
        if self.shutdown.is_cancelled() {
            return Err(ManagerError::ShutDown);
        }
        input.check_dim(self.log.input_dim())?;

        let submitted = self.interface.submit_job(&input).await;
        let job_id = submitted.as_ref().ok().cloned();
        let record_input = input.clone();
        let recorded = self
            .with_log(move |log| log.append_record(&record_input, job_id.as_ref()))
            .await;

        let job_id = match submitted {
            Ok(job_id) => job_id,
            Err(error) => {
                if let Err(log_error) = recorded {
                    tracing::error!(error = %log_error, input = %input, "failed to record rejected submission");
                }
                tracing::error!(error = %error, input = %input, "hardware rejected submission");
                return Err(error.into());
            }
        };
        if let Err(error) = recorded {
            tracing::error!(job_id = %job_id, error = %error, "submitted job could not be recorded; it will not be monitored");
            return Err(error);
        }

        {
            let mut state = self.state.lock().await;
            state.add_pending(job_id.clone());
            self.ensure_monitor(&mut state);
        }
        tracing::info!(job_id = %job_id, input = %input, "submitted simulation");
        Ok(Job::new(job_id, input))
    }

    /// Stop monitoring and reject further submissions.
    ///
    /// Waits for the monitor's in-flight pass, bounded by the configured
    /// shutdown timeout. Jobs are not cancelled on the hardware and remain
    /// pending in the log. Calling this again is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let first = !self.shutdown.is_cancelled();
        self.shutdown.cancel();
        let handle = self.state.lock().await.handle.take();
        let Some(mut handle) = handle else {
            if first {
                tracing::info!("job manager shut down");
            }
            return Ok(());
        };

        match self.shutdown_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined?,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = limit.as_secs(),
                        "job monitor did not stop in time; aborting it"
                    );
                    handle.abort();
                    self.mark_idle().await;
                }
            },
            None => handle.await?,
        }
        tracing::info!("job manager shut down");
        Ok(())
    }

    /// Ids awaiting an output, in submission order.
    pub async fn pending_jobs(&self) -> Vec<JobId> {
        self.state.lock().await.pending.clone()
    }

    /// Current monitor phase.
    #[must_use]
    pub fn phase(&self) -> MonitorPhase {
        *self.phase_tx.borrow()
    }

    /// Resolve once the monitor is idle.
    pub async fn wait_for_idle(&self) {
        let mut phase_rx = self.phase_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = phase_rx
            .wait_for(|phase| *phase == MonitorPhase::Idle)
            .await;
    }

    /// Simulations log backing this manager.
    #[must_use]
    pub fn log(&self) -> &Arc<SimulationsLog> {
        &self.log
    }

    /// Start the monitor unless one is running, there is nothing to poll,
    /// or the manager is shut down. Caller holds the state lock.
    fn ensure_monitor(self: &Arc<Self>, state: &mut MonitorState) {
        if state.running || state.pending.is_empty() || self.shutdown.is_cancelled() {
            return;
        }
        state.running = true;
        self.phase_tx.send_replace(MonitorPhase::Running);
        state.handle = Some(self.spawn_monitor());
    }

    async fn mark_idle(&self) {
        let mut state = self.state.lock().await;
        state.running = false;
        self.phase_tx.send_replace(MonitorPhase::Idle);
    }

    /// Run a log operation on the blocking pool.
    pub(crate) async fn with_log<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SimulationsLog) -> std::result::Result<T, LogError> + Send + 'static,
    {
        let log = Arc::clone(&self.log);
        let result = tokio::task::spawn_blocking(move || operation(&log)).await?;
        Ok(result?)
    }
}
