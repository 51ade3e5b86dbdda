use serde::{Deserialize, Serialize};

use crate::{JobId, Labels};

/// Request to provision a worker for one job.
///
/// `id` is the idempotency key: launching the same ID twice must leave exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub id: JobId,
    pub owner: String,
    pub repository: String,
    /// Labels exactly as requested by the job, marker label included.
    #[serde(default)]
    pub labels: Labels,
}
