//! Tests for the Slurm backend against fake scheduler executables.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use exauq_hardware::{HardwareError, HardwareInterface, SlurmConfig, SlurmInterface};
use exauq_types::{Input, JobId, JobStatus};

fn fake_executable(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().to_string()
}

fn slurm(dir: &Path, sbatch: &str, squeue: &str, scancel: &str) -> SlurmInterface {
    let mut config = SlurmConfig::new(dir.join("run.sh"), dir.join("out"));
    config.sbatch = fake_executable(dir, "sbatch", sbatch);
    config.squeue = fake_executable(dir, "squeue", squeue);
    config.scancel = fake_executable(dir, "scancel", scancel);
    config.num_retries = 2;
    config.retry_delay = Duration::from_millis(1);
    config.sbatch_args = vec!["--account=uq".to_string()];
    SlurmInterface::new(config).unwrap()
}

fn output_dir(dir: &Path) -> PathBuf {
    let out = dir.join("out");
    std::fs::create_dir_all(&out).unwrap();
    out
}

#[tokio::test]
async fn submit_parses_job_id_and_passes_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("sbatch-args");
    let sbatch = format!(
        "echo \"$@\" > '{}'\necho '4242;cluster'",
        args_file.display()
    );
    let interface = slurm(dir.path(), &sbatch, "exit 0", "exit 0");

    let input = Input::new(vec![1.0, 2.5]).unwrap();
    let job_id = interface.submit_job(&input).await.unwrap();
    assert_eq!(job_id, JobId::from(4242));

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert!(args.starts_with("--parsable --output "), "args: {args}");
    assert!(args.contains("exauq-%j.out --account=uq "), "args: {args}");
    assert!(args.trim_end().ends_with("run.sh 1.0 2.5"), "args: {args}");
}

#[tokio::test]
async fn status_follows_queue_then_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = output_dir(dir.path());
    let state_file = dir.path().join("state");
    std::fs::write(&state_file, "RUNNING\n").unwrap();
    let squeue = format!("cat '{}'", state_file.display());
    let interface = slurm(dir.path(), "echo 7", &squeue, "exit 0");
    let job_id = JobId::from(7);

    assert_eq!(
        interface.get_job_status(&job_id).await.unwrap(),
        JobStatus::Running
    );

    // Job left the queue without writing a result.
    std::fs::write(&state_file, "").unwrap();
    assert_eq!(
        interface.get_job_status(&job_id).await.unwrap(),
        JobStatus::Failed
    );
    assert!(matches!(
        interface.get_job_output(&job_id).await,
        Err(HardwareError::OutputUnavailable(_))
    ));

    std::fs::write(out.join("exauq-7.out"), "loading model\n3.5\n\n").unwrap();
    assert_eq!(
        interface.get_job_status(&job_id).await.unwrap(),
        JobStatus::Completed
    );
    assert_eq!(interface.get_job_output(&job_id).await.unwrap(), 3.5);
}

#[tokio::test]
async fn purged_job_id_falls_back_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = output_dir(dir.path());
    std::fs::write(out.join("exauq-9.out"), "-1.25\n").unwrap();
    let squeue = "echo 'slurm_load_jobs error: Invalid job id specified' >&2\nexit 1";
    let interface = slurm(dir.path(), "echo 9", squeue, "exit 0");

    assert_eq!(
        interface.get_job_status(&JobId::from(9)).await.unwrap(),
        JobStatus::Completed
    );
}

#[tokio::test]
async fn persistent_scheduler_failure_is_reported_and_cancel_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let squeue = "echo 'slurm_load_jobs error: Socket timed out' >&2\nexit 1";
    let interface = slurm(dir.path(), "echo 3", squeue, "exit 0");

    let error = interface.get_job_status(&JobId::from(3)).await.unwrap_err();
    match error {
        HardwareError::Command { code, stderr, .. } => {
            assert_eq!(code, 1);
            assert!(stderr.contains("Socket timed out"));
        }
        other => panic!("unexpected error: {other}"),
    }

    interface.cancel_job(&JobId::from(3)).await.unwrap();
}

#[tokio::test]
async fn sbatch_without_job_id_is_unexpected() {
    let dir = tempfile::tempdir().unwrap();
    let interface = slurm(dir.path(), "echo 'Submitted nothing'", "exit 0", "exit 0");
    let error = interface
        .submit_job(&Input::new(vec![1.0]).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(error, HardwareError::UnexpectedResponse(_)));
}
