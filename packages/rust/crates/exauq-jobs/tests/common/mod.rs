//! Shared test helpers for exauq-jobs: an in-memory hardware backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use exauq_hardware::{HardwareError, HardwareInterface, Result};
use exauq_jobs::JobManagerConfig;
use exauq_types::{Input, JobId, JobStatus};

/// Hardware double whose jobs change state only when a test says so.
#[derive(Default)]
pub struct MockHardware {
    next_id: AtomicU64,
    jobs: Mutex<HashMap<JobId, (JobStatus, Option<f64>)>>,
    submitted: Mutex<Vec<Input>>,
    pub reject_submissions: AtomicBool,
    pub fail_status: AtomicBool,
    pub status_calls: AtomicUsize,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job the backend already knows, e.g. from an earlier run.
    pub fn seed(&self, job_id: u64, status: JobStatus, output: Option<f64>) {
        self.jobs
            .lock()
            .unwrap()
            .insert(JobId::from(job_id), (status, output));
    }

    pub fn complete(&self, job_id: &JobId, output: f64) {
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), (JobStatus::Completed, Some(output)));
    }

    pub fn set_status(&self, job_id: &JobId, status: JobStatus) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(job_id) {
            job.0 = status;
        }
    }

    pub fn submitted(&self) -> Vec<Input> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl HardwareInterface for MockHardware {
    async fn submit_job(&self, input: &Input) -> Result<JobId> {
        if self.reject_submissions.load(Ordering::SeqCst) {
            return Err(HardwareError::Backend("queue full".to_string()));
        }
        self.submitted.lock().unwrap().push(input.clone());
        let job_id = JobId::from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), (JobStatus::Submitted, None));
        Ok(job_id)
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(HardwareError::Backend("scheduler unreachable".to_string()));
        }
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .map(|job| job.0)
            .ok_or_else(|| HardwareError::UnknownJob(job_id.clone()))
    }

    async fn get_job_output(&self, job_id: &JobId) -> Result<f64> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .and_then(|job| job.1)
            .ok_or_else(|| HardwareError::OutputUnavailable(job_id.clone()))
    }
}

/// Fast-polling config that does not block on recovered jobs.
pub fn fast_config() -> JobManagerConfig {
    JobManagerConfig {
        polling_interval_ms: 10,
        wait_for_pending: false,
        max_poll_failures: 5,
        shutdown_timeout_secs: Some(5),
    }
}

pub fn input(coords: &[f64]) -> Input {
    Input::new(coords.to_vec()).unwrap()
}

/// Await `future`, failing the test if it takes longer than five seconds.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("operation timed out")
}
