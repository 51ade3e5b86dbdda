use thiserror::Error;

use ephem_model::JobId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transaction precondition did not hold; nothing was written.
    #[error("transaction condition failed: {0}")]
    ConditionFailed(String),

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
