//! Job identifiers and submitted jobs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::input::Input;

/// Identifier assigned to a job by a hardware backend.
///
/// The canonical form is a non-empty string of decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Parse a job id, failing unless `value` matches `[0-9]+`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidJobId(value))
        }
    }

    /// Canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for JobId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// A submitted unit of simulation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    input: Input,
}

impl Job {
    /// Pair a backend-assigned id with the input it was submitted for.
    #[must_use]
    pub fn new(id: JobId, input: Input) -> Self {
        Self { id, input }
    }

    /// Backend-assigned identifier.
    #[must_use]
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Simulator input.
    #[must_use]
    pub fn input(&self) -> &Input {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_strings_round_trip() {
        for value in ["0", "42", "0007", "18446744073709551616000"] {
            let id = JobId::new(value).unwrap();
            assert_eq!(id.to_string(), value);
            assert_eq!(id.as_str(), value);
        }
    }

    #[test]
    fn non_digit_strings_are_rejected() {
        for value in ["", "a1", "1.0", "-3", " 4", "4 ", "１２"] {
            assert_eq!(
                JobId::new(value),
                Err(ValidationError::InvalidJobId(value.to_string())),
                "value: {value:?}"
            );
        }
    }

    #[test]
    fn equality_uses_canonical_form() {
        assert_eq!(JobId::from(42), JobId::new("42").unwrap());
        assert_ne!(JobId::new("042").unwrap(), JobId::new("42").unwrap());
    }

    #[test]
    fn deserialize_rejects_invalid_ids() {
        assert!(serde_json::from_str::<JobId>("\"17\"").is_ok());
        assert!(serde_json::from_str::<JobId>("\"x17\"").is_err());
    }

    #[test]
    fn job_exposes_id_and_input() {
        let input = Input::new(vec![1.0, 2.0]).unwrap();
        let job = Job::new(JobId::from(7), input.clone());
        assert_eq!(job.id().as_str(), "7");
        assert_eq!(job.input(), &input);
    }
}
