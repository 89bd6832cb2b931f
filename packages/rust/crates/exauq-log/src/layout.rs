//! Column layout of a log file, resolved once from its header.

use std::collections::HashSet;
use std::path::Path;

use exauq_types::{Input, JobId, format_real};

use crate::error::LogError;
use crate::record::SimulationRecord;

pub(crate) const OUTPUT_FIELD: &str = "Output";
pub(crate) const JOB_ID_FIELD: &str = "Job_ID";

/// Name of the 1-based input coordinate column.
pub(crate) fn input_field(position: usize) -> String {
    format!("Input_{position}")
}

/// Positions of the required columns inside a header.
#[derive(Debug, Clone)]
pub(crate) struct ColumnLayout {
    header: Vec<String>,
    inputs: Vec<usize>,
    output: usize,
    job_id: usize,
}

impl ColumnLayout {
    /// Header written to new log files: `Input_1..Input_dim, Output, Job_ID`.
    pub(crate) fn canonical(input_dim: usize) -> Self {
        let mut header: Vec<String> = (1..=input_dim).map(input_field).collect();
        header.push(OUTPUT_FIELD.to_string());
        header.push(JOB_ID_FIELD.to_string());
        Self {
            header,
            inputs: (0..input_dim).collect(),
            output: input_dim,
            job_id: input_dim + 1,
        }
    }

    /// Resolve the layout of an existing header. Column order is free and
    /// extra columns are carried along blank.
    pub(crate) fn from_header(
        header: Vec<String>,
        input_dim: usize,
        path: &Path,
    ) -> Result<Self, LogError> {
        let malformed = |reason: String| LogError::MalformedHeader {
            path: path.to_path_buf(),
            reason,
        };

        let repeated = repeated_fields(&header);
        if !repeated.is_empty() {
            return Err(malformed(format!(
                "repeated fields: {}",
                repeated.join(", ")
            )));
        }

        let position = |name: &str| header.iter().position(|field| field == name);
        let required: Vec<String> = (1..=input_dim)
            .map(input_field)
            .chain([OUTPUT_FIELD.to_string(), JOB_ID_FIELD.to_string()])
            .collect();
        let missing: Vec<&str> = required
            .iter()
            .map(String::as_str)
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(malformed(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let inputs = (1..=input_dim)
            .filter_map(|i| position(&input_field(i)))
            .collect();
        let output = position(OUTPUT_FIELD).unwrap_or_default();
        let job_id = position(JOB_ID_FIELD).unwrap_or_default();
        Ok(Self {
            header,
            inputs,
            output,
            job_id,
        })
    }

    pub(crate) fn header(&self) -> &[String] {
        &self.header
    }

    pub(crate) fn width(&self) -> usize {
        self.header.len()
    }

    pub(crate) fn output_column(&self) -> usize {
        self.output
    }

    pub(crate) fn job_id_column(&self) -> usize {
        self.job_id
    }

    /// Lay a record out as a row of this header.
    pub(crate) fn render(&self, record: &SimulationRecord) -> Vec<String> {
        let mut row = vec![String::new(); self.width()];
        for (&column, value) in self.inputs.iter().zip(record.input.iter()) {
            row[column] = format_real(value);
        }
        if let Some(output) = record.output {
            row[self.output] = format_real(output);
        }
        if let Some(job_id) = &record.job_id {
            row[self.job_id] = job_id.to_string();
        }
        row
    }

    /// Parse a row; `row_number` is 1-based and only used for diagnostics.
    pub(crate) fn parse(
        &self,
        row: &[String],
        row_number: usize,
    ) -> Result<SimulationRecord, LogError> {
        let malformed = |reason: String| LogError::MalformedRecord {
            row: row_number,
            reason,
        };
        if row.len() != self.width() {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                self.width(),
                row.len()
            )));
        }

        let mut coords = Vec::with_capacity(self.inputs.len());
        for (i, &column) in self.inputs.iter().enumerate() {
            let text = row[column].trim();
            let value = text.parse::<f64>().map_err(|_| {
                malformed(format!("{} is not a real number: '{text}'", input_field(i + 1)))
            })?;
            coords.push(value);
        }
        let input = Input::new(coords).map_err(|error| malformed(error.to_string()))?;

        let output = parse_output(&row[self.output]).map_err(malformed)?;

        let job_id_text = row[self.job_id].trim();
        let job_id = if job_id_text.is_empty() {
            None
        } else {
            Some(JobId::new(job_id_text).map_err(|error| malformed(error.to_string()))?)
        };

        Ok(SimulationRecord {
            input,
            output,
            job_id,
        })
    }
}

fn repeated_fields(header: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut repeated: Vec<String> = header
        .iter()
        .filter(|name| !name.is_empty() && !seen.insert(name.as_str()))
        .cloned()
        .collect();
    repeated.sort_unstable();
    repeated.dedup();
    repeated
}

/// Parse an `Output` cell; blank means not yet known.
pub(crate) fn parse_output(text: &str) -> Result<Option<f64>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{OUTPUT_FIELD} is not a real number: '{text}'"))
}
