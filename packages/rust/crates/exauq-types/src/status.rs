//! Job lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// State of a job as reported by a hardware backend or derived from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the backend but not started.
    Submitted,
    /// Executing.
    Running,
    /// Finished with an output.
    Completed,
    /// Finished without an output.
    Failed,
    /// Cancelled before finishing.
    Cancelled,
    /// Never accepted by the backend.
    FailedSubmit,
}

impl JobStatus {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Submitted,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
        Self::FailedSubmit,
    ];

    /// Whether no further state change can occur.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Submitted | Self::Running)
    }

    /// Snake-case label used in text and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::FailedSubmit => "failed_submit",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::FailedSubmit.is_terminal());
    }

    #[test]
    fn parse_accepts_labels_and_variants() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
        assert_eq!("Failed-Submit".parse(), Ok(JobStatus::FailedSubmit));
        assert_eq!(
            "done".parse::<JobStatus>(),
            Err(ValidationError::UnknownStatus("done".to_string()))
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::FailedSubmit).unwrap(),
            "\"failed_submit\""
        );
        let status: JobStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, JobStatus::Running);
    }
}
