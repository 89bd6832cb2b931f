//! The simulations log: a CSV file with one row per submission attempt.
//!
//! Every public operation is an atomic unit for callers in this process: an
//! internal mutex serializes access, appends go straight to the file, and
//! result updates replace the file through a temp file in the same
//! directory.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use csv::{ReaderBuilder, WriterBuilder};
use exauq_types::{Input, JobId, JobStatus, format_real};
use tempfile::NamedTempFile;

use crate::error::LogError;
use crate::layout::{ColumnLayout, parse_output};
use crate::record::SimulationRecord;

/// Durable, queryable record of all simulation submissions.
#[derive(Debug)]
pub struct SimulationsLog {
    path: PathBuf,
    input_dim: usize,
    layout: ColumnLayout,
    guard: Mutex<()>,
}

impl SimulationsLog {
    /// Open the log at `path`, creating it with header
    /// `Input_1..Input_<input_dim>, Output, Job_ID` if it does not exist.
    ///
    /// An existing file is never re-created; its header must contain the
    /// required columns, in any order.
    pub fn open(path: impl Into<PathBuf>, input_dim: usize) -> Result<Self, LogError> {
        let path = path.into();
        let layout = match read_header(&path)? {
            Some(header) => ColumnLayout::from_header(header, input_dim, &path)?,
            None => {
                let layout = ColumnLayout::canonical(input_dim);
                write_rows(&mut File::create(&path)?, layout.header(), &[])?;
                tracing::info!(path = %path.display(), input_dim, "created simulations log");
                layout
            }
        };
        Ok(Self {
            path,
            input_dim,
            layout,
            guard: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dimension of the inputs held by this log.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Header as found in (or written to) the file.
    #[must_use]
    pub fn header(&self) -> &[String] {
        self.layout.header()
    }

    /// Append a row for `input`, with blank output and a blank job id when
    /// `job_id` is `None`.
    pub fn append_record(&self, input: &Input, job_id: Option<&JobId>) -> Result<(), LogError> {
        input.check_dim(self.input_dim)?;
        let row = self.layout.render(&SimulationRecord {
            input: input.clone(),
            output: None,
            job_id: job_id.cloned(),
        });

        let _guard = self.lock();
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(&row)?;
        writer.flush()?;
        tracing::debug!(
            path = %self.path.display(),
            job_id = job_id.map(JobId::as_str).unwrap_or_default(),
            "appended simulations log record"
        );
        Ok(())
    }

    /// Set the output of every row whose `Job_ID` is `job_id`.
    ///
    /// Writing the same output twice is a no-op. Writing a different output
    /// over an existing one fails with [`LogError::OutputConflict`] and
    /// leaves the file untouched.
    pub fn record_result(&self, job_id: &JobId, output: f64) -> Result<(), LogError> {
        let _guard = self.lock();
        let mut rows = self.read_raw_rows()?;
        let output_column = self.layout.output_column();
        let job_id_column = self.layout.job_id_column();

        let mut found = false;
        let mut matched = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if row[job_id_column].trim() != job_id.as_str() {
                continue;
            }
            found = true;
            let existing = parse_output(&row[output_column]).map_err(|reason| {
                LogError::MalformedRecord {
                    row: index + 1,
                    reason,
                }
            })?;
            match existing {
                None => matched.push(index),
                Some(existing) if existing == output => {}
                Some(existing) => {
                    return Err(LogError::OutputConflict {
                        job_id: job_id.clone(),
                        existing,
                        new: output,
                    });
                }
            }
        }

        if !found {
            return Err(LogError::Lookup(job_id.clone()));
        }
        if matched.is_empty() {
            tracing::debug!(job_id = %job_id, "output already recorded; nothing to write");
            return Ok(());
        }

        let text = format_real(output);
        for index in matched {
            rows[index][output_column].clone_from(&text);
        }
        self.replace_rows(&rows)?;
        tracing::debug!(job_id = %job_id, output = %text, "recorded simulation output");
        Ok(())
    }

    /// Job ids of rows with a job id and no output, in file order.
    pub fn list_pending(&self) -> Result<Vec<JobId>, LogError> {
        Ok(self
            .read_records()?
            .into_iter()
            .filter(SimulationRecord::is_pending)
            .filter_map(|record| record.job_id)
            .collect())
    }

    /// Largest job id in the log that fits in a `u64`, if any.
    ///
    /// Backends that number their own jobs start above this so ids stay unique
    /// across runs sharing one log.
    pub fn max_job_number(&self) -> Result<Option<u64>, LogError> {
        Ok(self
            .read_records()?
            .iter()
            .filter_map(|record| record.job_id.as_ref())
            .filter_map(|job_id| job_id.as_str().parse::<u64>().ok())
            .max())
    }

    /// Records matching both filters; `None` matches everything.
    ///
    /// Status is derived from the row, see [`SimulationRecord::status`].
    pub fn get_records(
        &self,
        job_ids: Option<&[JobId]>,
        statuses: Option<&[JobStatus]>,
    ) -> Result<Vec<SimulationRecord>, LogError> {
        Ok(self
            .read_records()?
            .into_iter()
            .filter(|record| {
                job_ids.is_none_or(|ids| record.job_id.as_ref().is_some_and(|id| ids.contains(id)))
            })
            .filter(|record| statuses.is_none_or(|statuses| statuses.contains(&record.status())))
            .collect())
    }

    /// Every `(input, output)` pair in file order; `None` while unknown.
    pub fn get_simulations(&self) -> Result<Vec<(Input, Option<f64>)>, LogError> {
        Ok(self
            .read_records()?
            .into_iter()
            .map(|record| (record.input, record.output))
            .collect())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_records(&self) -> Result<Vec<SimulationRecord>, LogError> {
        let _guard = self.lock();
        self.read_raw_rows()?
            .iter()
            .enumerate()
            .map(|(index, row)| self.layout.parse(row, index + 1))
            .collect()
    }

    /// Data rows as text, checked for field count. Caller holds the lock.
    fn read_raw_rows(&self) -> Result<Vec<Vec<String>>, LogError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let row: Vec<String> = record?.iter().map(str::to_string).collect();
            if row.len() != self.layout.width() {
                return Err(LogError::MalformedRecord {
                    row: index + 1,
                    reason: format!(
                        "expected {} fields, found {}",
                        self.layout.width(),
                        row.len()
                    ),
                });
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rewrite the whole file atomically. Caller holds the lock.
    fn replace_rows(&self, rows: &[Vec<String>]) -> Result<(), LogError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        write_rows(tmp.as_file_mut(), self.layout.header(), rows)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

/// First row of an existing, non-empty file.
fn read_header(path: &Path) -> Result<Option<Vec<String>>, LogError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.len() > 0 => {}
        Ok(_) => return Ok(None),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    match reader.records().next() {
        Some(record) => Ok(Some(
            record?.iter().map(|field| field.trim().to_string()).collect(),
        )),
        None => Ok(None),
    }
}

fn write_rows<W: Write>(out: W, header: &[String], rows: &[Vec<String>]) -> Result<(), LogError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
