//! Tests for the simulations log file operations.

use std::path::Path;

use exauq_log::{LogError, SimulationsLog};
use exauq_types::{Input, JobId, JobStatus};
use tempfile::TempDir;

fn input(coords: &[f64]) -> Input {
    Input::new(coords.to_vec()).unwrap()
}

fn id(value: &str) -> JobId {
    JobId::new(value).unwrap()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn open_creates_file_with_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    let log = SimulationsLog::open(&path, 3).unwrap();
    assert_eq!(read(&path), "Input_1,Input_2,Input_3,Output,Job_ID\n");
    assert_eq!(log.input_dim(), 3);
    assert_eq!(log.path(), path.as_path());
}

#[test]
fn open_keeps_existing_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    std::fs::write(&path, "Input_1,Output,Job_ID\n5.0,,7\n").unwrap();

    let log = SimulationsLog::open(&path, 1).unwrap();
    assert_eq!(read(&path), "Input_1,Output,Job_ID\n5.0,,7\n");
    assert_eq!(log.list_pending().unwrap(), vec![id("7")]);
}

#[test]
fn open_rejects_header_missing_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    std::fs::write(&path, "Input_1,Output\n").unwrap();
    let error = SimulationsLog::open(&path, 1).unwrap_err();
    assert!(matches!(error, LogError::MalformedHeader { .. }));
}

#[test]
fn append_records_job_id_or_blank() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    let log = SimulationsLog::open(&path, 2).unwrap();

    log.append_record(&input(&[1.0, 2.0]), Some(&id("42"))).unwrap();
    log.append_record(&input(&[9.0, 0.5]), None).unwrap();

    assert_eq!(
        read(&path),
        "Input_1,Input_2,Output,Job_ID\n1.0,2.0,,42\n9.0,0.5,,\n"
    );
    let records = log.get_records(None, None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].job_id, Some(id("42")));
    assert_eq!(records[1].job_id, None);
    assert_eq!(records[1].status(), JobStatus::FailedSubmit);
}

#[test]
fn append_rejects_wrong_dimension() {
    let dir = TempDir::new().unwrap();
    let log = SimulationsLog::open(dir.path().join("simulations.csv"), 2).unwrap();
    let error = log.append_record(&input(&[1.0]), None).unwrap_err();
    assert!(matches!(error, LogError::Validation(_)));
    assert!(log.get_records(None, None).unwrap().is_empty());
}

#[test]
fn record_result_updates_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    let log = SimulationsLog::open(&path, 2).unwrap();
    log.append_record(&input(&[1.0, 2.0]), Some(&id("42"))).unwrap();

    log.record_result(&id("42"), 3.5).unwrap();

    assert_eq!(read(&path), "Input_1,Input_2,Output,Job_ID\n1.0,2.0,3.5,42\n");
    assert!(log.list_pending().unwrap().is_empty());
    assert_eq!(
        log.get_simulations().unwrap(),
        vec![(input(&[1.0, 2.0]), Some(3.5))]
    );
}

#[test]
fn record_result_unknown_job_is_lookup_error() {
    let dir = TempDir::new().unwrap();
    let log = SimulationsLog::open(dir.path().join("simulations.csv"), 1).unwrap();
    log.append_record(&input(&[1.0]), Some(&id("1"))).unwrap();

    let error = log.record_result(&id("2"), 1.0).unwrap_err();
    assert!(matches!(error, LogError::Lookup(ref job) if job == &id("2")));
    assert!(error.is_permanent());
}

#[test]
fn record_result_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    let log = SimulationsLog::open(&path, 1).unwrap();
    log.append_record(&input(&[1.0]), Some(&id("5"))).unwrap();

    log.record_result(&id("5"), 0.25).unwrap();
    let once = read(&path);
    log.record_result(&id("5"), 0.25).unwrap();
    assert_eq!(read(&path), once);
}

#[test]
fn record_result_refuses_to_overwrite_different_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    let log = SimulationsLog::open(&path, 1).unwrap();
    log.append_record(&input(&[1.0]), Some(&id("5"))).unwrap();
    log.record_result(&id("5"), 0.25).unwrap();
    let before = read(&path);

    let error = log.record_result(&id("5"), 0.5).unwrap_err();
    assert!(matches!(error, LogError::OutputConflict { .. }));
    assert_eq!(read(&path), before);
}

#[test]
fn failed_submissions_are_never_pending() {
    let dir = TempDir::new().unwrap();
    let log = SimulationsLog::open(dir.path().join("simulations.csv"), 1).unwrap();
    log.append_record(&input(&[1.0]), None).unwrap();
    log.append_record(&input(&[2.0]), Some(&id("3"))).unwrap();
    log.append_record(&input(&[3.0]), Some(&id("1"))).unwrap();
    log.append_record(&input(&[4.0]), Some(&id("2"))).unwrap();
    log.record_result(&id("1"), 7.0).unwrap();

    assert_eq!(log.list_pending().unwrap(), vec![id("3"), id("2")]);
}

#[test]
fn max_job_number_skips_blank_and_oversized_ids() {
    let dir = TempDir::new().unwrap();
    let log = SimulationsLog::open(dir.path().join("simulations.csv"), 1).unwrap();
    assert_eq!(log.max_job_number().unwrap(), None);

    log.append_record(&input(&[1.0]), Some(&id("9"))).unwrap();
    log.append_record(&input(&[2.0]), None).unwrap();
    log.append_record(&input(&[3.0]), Some(&id("12"))).unwrap();
    log.append_record(&input(&[4.0]), Some(&id("99999999999999999999999"))).unwrap();
    log.record_result(&id("12"), 1.0).unwrap();

    assert_eq!(log.max_job_number().unwrap(), Some(12));
}

#[test]
fn get_records_filters_by_job_and_status() {
    let dir = TempDir::new().unwrap();
    let log = SimulationsLog::open(dir.path().join("simulations.csv"), 1).unwrap();
    log.append_record(&input(&[1.0]), Some(&id("1"))).unwrap();
    log.append_record(&input(&[2.0]), Some(&id("2"))).unwrap();
    log.append_record(&input(&[3.0]), None).unwrap();
    log.record_result(&id("2"), 4.0).unwrap();

    let by_id = log.get_records(Some([id("2")].as_slice()), None).unwrap();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].output, Some(4.0));

    let submitted = log
        .get_records(None, Some([JobStatus::Submitted].as_slice()))
        .unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].job_id, Some(id("1")));

    let failed = log
        .get_records(None, Some([JobStatus::FailedSubmit].as_slice()))
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].input, input(&[3.0]));

    let both = log
        .get_records(
            Some([id("1"), id("2")].as_slice()),
            Some([JobStatus::Completed].as_slice()),
        )
        .unwrap();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].to_fields()["Job_ID"], "2");
}

#[test]
fn reordered_header_with_extra_column_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    std::fs::write(&path, "Job_ID,Note,Input_1,Output\n").unwrap();
    let log = SimulationsLog::open(&path, 1).unwrap();

    log.append_record(&input(&[2.5]), Some(&id("11"))).unwrap();
    log.record_result(&id("11"), -1.0).unwrap();

    assert_eq!(read(&path), "Job_ID,Note,Input_1,Output\n11,,2.5,-1.0\n");
    assert_eq!(
        log.get_simulations().unwrap(),
        vec![(input(&[2.5]), Some(-1.0))]
    );
}

#[test]
fn malformed_rows_fail_reads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("simulations.csv");
    std::fs::write(&path, "Input_1,Output,Job_ID\n1.0,,abc\n").unwrap();
    let log = SimulationsLog::open(&path, 1).unwrap();

    let error = log.list_pending().unwrap_err();
    assert!(matches!(error, LogError::MalformedRecord { row: 1, .. }));

    std::fs::write(&path, "Input_1,Output,Job_ID\n1.0,,4,extra\n").unwrap();
    let error = log.get_simulations().unwrap_err();
    assert!(matches!(error, LogError::MalformedRecord { row: 1, .. }));
}

#[test]
fn log_is_shared_across_threads() {
    let dir = TempDir::new().unwrap();
    let log = std::sync::Arc::new(SimulationsLog::open(dir.path().join("s.csv"), 1).unwrap());

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let log = std::sync::Arc::clone(&log);
            std::thread::spawn(move || {
                #[allow(clippy::cast_precision_loss)]
                let coord = i as f64;
                log.append_record(&input(&[coord]), Some(&JobId::from(i)))
                    .unwrap();
                log.record_result(&JobId::from(i), coord * 2.0).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let records = log.get_records(None, None).unwrap();
    assert_eq!(records.len(), 8);
    assert!(records.iter().all(|record| record.output.is_some()));
}
