mod status;
pub use status::JobStatus;

mod content;
pub use content::{INVALID_GZIP, INVALID_JSON, JobContent, JobPayload};

use serde::{Deserialize, Serialize};

use crate::{Host, JobId};

/// One row of the job store.
///
/// Partitioned by `host`; at most one row exists per `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Backend key this job is routed to.
    pub host: Host,
    /// Operating system label the worker must provide.
    pub os: String,
    pub status: JobStatus,
    /// Opaque compressed payload.
    pub content: JobContent,
    /// Creation time (unix millis); only used to order reads.
    #[serde(default)]
    pub created_at_ms: u64,
}
