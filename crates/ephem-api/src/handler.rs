use async_trait::async_trait;
use ephem_core::{intake::JobCompletion, publisher::CycleReport, store::PutOutcome};
use ephem_model::{JobId, JobPayload, LaunchRequest, TerminationRequest};

use crate::ApiError;

/// Operations reachable through the event trigger.
///
/// [`ServiceAdapter`](crate::ServiceAdapter) delegates to the core services; custom handlers can
/// add authentication or rate limiting in front of them.
#[async_trait]
pub trait TriggerHandler: Send + Sync + 'static {
    /// Provision a worker (already existing workers are success).
    async fn launch(&self, req: LaunchRequest) -> Result<(), ApiError>;

    /// Tear down a worker (missing workers are success).
    async fn terminate(&self, req: TerminationRequest) -> Result<(), ApiError>;

    /// Run one publish cycle over all hosts.
    async fn publish(&self) -> Result<Vec<CycleReport>, ApiError>;

    /// Store a queued job.
    async fn enqueue(&self, payload: JobPayload) -> Result<PutOutcome, ApiError>;

    /// Mark a job completed.
    async fn complete(&self, event: JobCompletion) -> Result<Option<JobId>, ApiError>;
}
