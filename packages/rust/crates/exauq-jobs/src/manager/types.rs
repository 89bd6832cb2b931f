//! Shared types for the job manager.

use exauq_types::JobId;
use tokio::task::JoinHandle;

/// Config for the job manager and its monitor.
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Pause between monitor passes in milliseconds.
    pub polling_interval_ms: u64,
    /// Block in `start` until jobs recovered from the log are reconciled.
    pub wait_for_pending: bool,
    /// Consecutive poll failures tolerated per job before it is dropped.
    pub max_poll_failures: u32,
    /// Upper bound on waiting for the monitor in `shutdown`; `None` waits forever.
    pub shutdown_timeout_secs: Option<u64>,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: 10_000,
            wait_for_pending: true,
            max_poll_failures: 5,
            shutdown_timeout_secs: Some(60),
        }
    }
}

/// Whether the monitor task is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// No monitor running; the pending-set was empty when it last stopped.
    Idle,
    /// A monitor task is polling the pending-set.
    Running,
}

#[derive(Debug, Default)]
pub(super) struct MonitorState {
    /// Jobs awaiting an output, in submission order.
    pub(super) pending: Vec<JobId>,
    pub(super) running: bool,
    pub(super) handle: Option<JoinHandle<()>>,
}

impl MonitorState {
    pub(super) fn add_pending(&mut self, job_id: JobId) {
        if !self.pending.contains(&job_id) {
            self.pending.push(job_id);
        }
    }

    pub(super) fn remove_pending(&mut self, job_id: &JobId) {
        self.pending.retain(|pending| pending != job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_set_keeps_insertion_order_without_duplicates() {
        let mut state = MonitorState::default();
        state.add_pending(JobId::from(3));
        state.add_pending(JobId::from(1));
        state.add_pending(JobId::from(3));
        state.add_pending(JobId::from(2));
        assert_eq!(
            state.pending,
            vec![JobId::from(3), JobId::from(1), JobId::from(2)]
        );

        state.remove_pending(&JobId::from(1));
        assert_eq!(state.pending, vec![JobId::from(3), JobId::from(2)]);
    }

    #[test]
    fn default_config_polls_every_ten_seconds() {
        let config = JobManagerConfig::default();
        assert_eq!(config.polling_interval_ms, 10_000);
        assert!(config.wait_for_pending);
    }
}
