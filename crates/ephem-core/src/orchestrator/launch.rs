use std::sync::Arc;

use ephem_model::LaunchRequest;
use tracing::{debug, info, instrument};

use crate::{
    error::CoreError,
    metrics::{MetricsHandle, Outcome, noop_metrics},
    router::LabelRouter,
};

/// Launches one worker per request, treating "already exists" as success.
pub struct LaunchService {
    router: Arc<LabelRouter>,
    metrics: MetricsHandle,
}

impl LaunchService {
    pub fn new(router: Arc<LabelRouter>) -> Self {
        Self {
            router,
            metrics: noop_metrics(),
        }
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Route and launch.
    ///
    /// Fails with [`CoreError::Routing`] when no target matches; backend errors other than
    /// `AlreadyExists` are returned as [`CoreError::Backend`].
    #[instrument(level = "debug", skip(self, req), fields(id = req.id))]
    pub async fn launch(&self, req: &LaunchRequest) -> Result<(), CoreError> {
        let target = self.router.route_launch(&req.labels)?;
        let backend = target.backend();
        debug!(labels = %req.labels, target = %target, "launch routed");

        match backend.launch(req).await {
            Ok(()) => {
                self.metrics.record_launch(backend.name(), Outcome::Applied);
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                info!(id = req.id, backend = backend.name(), "worker already exists");
                self.metrics.record_launch(backend.name(), Outcome::Absorbed);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_launch(backend.name(), Outcome::Failed);
                Err(e.into())
            }
        }
    }
}
