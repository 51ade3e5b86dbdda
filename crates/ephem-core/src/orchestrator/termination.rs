use std::sync::Arc;

use ephem_model::TerminationRequest;
use tracing::{debug, info, instrument};

use crate::{
    error::CoreError,
    metrics::{MetricsHandle, Outcome, noop_metrics},
    router::LabelRouter,
};

/// Tears down one worker per request, treating "not exists" as success.
pub struct TerminationService {
    router: Arc<LabelRouter>,
    metrics: MetricsHandle,
}

impl TerminationService {
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

    /// Route by discriminator and terminate.
    #[instrument(level = "debug", skip(self, req), fields(id = req.id))]
    pub async fn terminate(&self, req: &TerminationRequest) -> Result<(), CoreError> {
        let target = self.router.route_termination(&req.labels)?;
        let backend = target.backend();
        debug!(labels = %req.labels, target = target.host(), "termination routed");

        match backend.terminate(req.id).await {
            Ok(()) => {
                self.metrics.record_termination(backend.name(), Outcome::Applied);
                Ok(())
            }
            Err(e) if e.is_not_exists() => {
                info!(id = req.id, backend = backend.name(), "worker not exists");
                self.metrics
                    .record_termination(backend.name(), Outcome::Absorbed);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_termination(backend.name(), Outcome::Failed);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendError};
    use crate::router::RouteTarget;

    use async_trait::async_trait;
    use ephem_model::{JobId, LaunchRequest, Labels};
    use std::sync::Mutex;

    /// Backend holding a set of live worker IDs.
    struct LiveSet {
        live: Mutex<Vec<JobId>>,
        fail: bool,
    }

    #[async_trait]
    impl Backend for LiveSet {
        fn name(&self) -> &str {
            "pod"
        }

        async fn launch(&self, _req: &LaunchRequest) -> Result<(), BackendError> {
            Ok(())
        }

        async fn terminate(&self, id: JobId) -> Result<(), BackendError> {
            if self.fail {
                return Err(BackendError::Internal("api server unreachable".into()));
            }
            let mut live = self.live.lock().unwrap();
            match live.iter().position(|x| *x == id) {
                Some(i) => {
                    live.remove(i);
                    Ok(())
                }
                None => Err(BackendError::not_exists(id, "pod")),
            }
        }
    }

    fn service(backend: Arc<LiveSet>) -> TerminationService {
        let router = LabelRouter::new().with_target(RouteTarget::new("pod", ["pod", "ubuntu"], backend));
        TerminationService::new(Arc::new(router))
    }

    fn request(id: JobId, labels: &[&str]) -> TerminationRequest {
        TerminationRequest {
            id,
            labels: labels.iter().copied().collect::<Labels>(),
        }
    }

    #[tokio::test]
    async fn terminate_twice_is_success_both_times() {
        let backend = Arc::new(LiveSet {
            live: Mutex::new(vec![5]),
            fail: false,
        });
        let svc = service(backend.clone());
        let req = request(5, &["self-hosted", "ubuntu", "pod"]);

        svc.terminate(&req).await.expect("first terminate");
        svc.terminate(&req).await.expect("redelivered terminate");

        assert!(backend.live.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn routes_on_discriminator_alone() {
        let backend = Arc::new(LiveSet {
            live: Mutex::new(vec![1]),
            fail: false,
        });
        let svc = service(backend.clone());

        svc.terminate(&request(1, &["pod"])).await.unwrap();
        assert!(backend.live.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_discriminator_is_routing_error() {
        let svc = service(Arc::new(LiveSet {
            live: Mutex::new(vec![]),
            fail: false,
        }));

        let err = svc
            .terminate(&request(1, &["self-hosted", "ubuntu", "vm"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Routing {
                action: "termination",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn other_backend_errors_are_surfaced() {
        let svc = service(Arc::new(LiveSet {
            live: Mutex::new(vec![1]),
            fail: true,
        }));

        let err = svc.terminate(&request(1, &["pod"])).await.unwrap_err();
        assert!(matches!(err, CoreError::Backend(BackendError::Internal(_))));
    }
}
