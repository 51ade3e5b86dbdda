use std::sync::Arc;

use async_trait::async_trait;
use ephem_core::{
    intake::{JobCompletion, JobIntake},
    orchestrator::{LaunchService, TerminationService},
    publisher::{CycleReport, Publisher},
    store::PutOutcome,
};
use ephem_model::{JobId, JobPayload, LaunchRequest, TerminationRequest};
use tokio_util::sync::CancellationToken;

use crate::{ApiError, TriggerHandler};

/// [`TriggerHandler`] that delegates straight to the core services.
pub struct ServiceAdapter {
    launcher: Arc<LaunchService>,
    terminator: Arc<TerminationService>,
    publisher: Arc<Publisher>,
    intake: Arc<JobIntake>,
    cancel: CancellationToken,
}

impl ServiceAdapter {
    pub fn new(
        launcher: Arc<LaunchService>,
        terminator: Arc<TerminationService>,
        publisher: Arc<Publisher>,
        intake: Arc<JobIntake>,
    ) -> Self {
        Self {
            launcher,
            terminator,
            publisher,
            intake,
            cancel: CancellationToken::new(),
        }
    }

    /// Publish runs triggered over the API stop when `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl TriggerHandler for ServiceAdapter {
    async fn launch(&self, req: LaunchRequest) -> Result<(), ApiError> {
        self.launcher.launch(&req).await.map_err(ApiError::from)
    }

    async fn terminate(&self, req: TerminationRequest) -> Result<(), ApiError> {
        self.terminator.terminate(&req).await.map_err(ApiError::from)
    }

    async fn publish(&self) -> Result<Vec<CycleReport>, ApiError> {
        self.publisher
            .publish(&self.cancel)
            .await
            .map_err(ApiError::from)
    }

    async fn enqueue(&self, payload: JobPayload) -> Result<PutOutcome, ApiError> {
        self.intake.enqueue(payload).await.map_err(ApiError::from)
    }

    async fn complete(&self, event: JobCompletion) -> Result<Option<JobId>, ApiError> {
        self.intake.complete(event).await.map_err(ApiError::from)
    }
}
