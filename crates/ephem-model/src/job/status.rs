use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Lifecycle state of a job row.
///
/// Legal transitions:
/// - `Queued` → `InProgress` (admitted by the publisher) → removed;
/// - `Completed` → removed (reaped by the publisher).
///
/// `Completed` is set by the job producer when the CI system reports the job finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for admission.
    Queued,
    /// Admitted; a worker has been (or is being) launched.
    InProgress,
    /// Finished upstream; the worker must be torn down.
    Completed,
}

impl JobStatus {
    /// Canonical wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
        }
    }

    /// Statuses that occupy a concurrency slot on their host.
    pub const ACTIVE: [JobStatus; 2] = [JobStatus::Queued, JobStatus::InProgress];
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim() {
            "queued" => Ok(JobStatus::Queued),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}
