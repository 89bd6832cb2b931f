//! Typed simulations log rows.

use std::collections::BTreeMap;

use exauq_types::{Input, JobId, JobStatus, format_real};
use serde::Serialize;

use crate::layout::{JOB_ID_FIELD, OUTPUT_FIELD, input_field};

/// One row of the simulations log: a submission attempt and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRecord {
    /// Submitted simulator input.
    pub input: Input,
    /// Simulator output, once reconciled.
    pub output: Option<f64>,
    /// Backend job id; `None` when submission failed.
    pub job_id: Option<JobId>,
}

impl SimulationRecord {
    /// Status implied by the row alone.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        match (&self.job_id, self.output) {
            (_, Some(_)) => JobStatus::Completed,
            (None, None) => JobStatus::FailedSubmit,
            (Some(_), None) => JobStatus::Submitted,
        }
    }

    /// Whether the monitor still has to reconcile this row.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.job_id.is_some() && self.output.is_none()
    }

    /// Field-name to text view, with blanks for unknown values.
    #[must_use]
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = self
            .input
            .iter()
            .enumerate()
            .map(|(i, value)| (input_field(i + 1), format_real(value)))
            .collect();
        fields.insert(
            OUTPUT_FIELD.to_string(),
            self.output.map(format_real).unwrap_or_default(),
        );
        fields.insert(
            JOB_ID_FIELD.to_string(),
            self.job_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        );
        fields
    }
}
