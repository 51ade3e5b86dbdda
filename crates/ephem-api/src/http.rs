use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use ephem_core::{intake::JobCompletion, publisher::CycleReport, store::PutOutcome};
use ephem_model::{JobId, JobPayload, LaunchRequest, TerminationRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{ApiError, TriggerEvent, TriggerHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: TriggerHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build the axum router.
    ///
    /// Every route takes a [`TriggerEvent`] body:
    /// - POST /api/v1/launch         - record body is a `LaunchRequest`
    /// - POST /api/v1/terminate      - record body is a `TerminationRequest`
    /// - POST /api/v1/publish        - record body is ignored
    /// - POST /api/v1/jobs           - record body is a `JobPayload` (queued job)
    /// - POST /api/v1/jobs/complete  - record body is a `JobCompletion`
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/launch", post(launch::<H>))
            .route("/api/v1/terminate", post(terminate::<H>))
            .route("/api/v1/publish", post(publish::<H>))
            .route("/api/v1/jobs", post(enqueue::<H>))
            .route("/api/v1/jobs/complete", post(complete::<H>))
            .with_state(self.handler)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishResponse {
    pub hosts: Vec<CycleReport>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnqueueResponse {
    pub id: JobId,
    pub duplicate: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompleteResponse {
    /// Job marked completed; `None` if the event was ignored.
    pub id: Option<JobId>,
}

/// POST /api/v1/launch
async fn launch<H>(
    State(handler): State<Arc<H>>,
    Json(event): Json<TriggerEvent>,
) -> Result<impl IntoResponse, ApiError>
where
    H: TriggerHandler,
{
    let req: LaunchRequest = event.parse()?;
    info!(id = req.id, labels = %req.labels, "launching worker");

    handler.launch(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/terminate
async fn terminate<H>(
    State(handler): State<Arc<H>>,
    Json(event): Json<TriggerEvent>,
) -> Result<impl IntoResponse, ApiError>
where
    H: TriggerHandler,
{
    let req: TerminationRequest = event.parse()?;
    info!(id = req.id, "terminating worker");

    handler.terminate(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/publish
async fn publish<H>(
    State(handler): State<Arc<H>>,
    Json(event): Json<TriggerEvent>,
) -> Result<impl IntoResponse, ApiError>
where
    H: TriggerHandler,
{
    let body = event.single_body()?;
    debug!(body, "publish triggered");

    let hosts = handler.publish().await?;
    Ok(Json(PublishResponse { hosts }))
}

/// POST /api/v1/jobs
async fn enqueue<H>(
    State(handler): State<Arc<H>>,
    Json(event): Json<TriggerEvent>,
) -> Result<impl IntoResponse, ApiError>
where
    H: TriggerHandler,
{
    let payload: JobPayload = event.parse()?;
    if payload.id == 0 {
        return Err(ApiError::InvalidRequest("job id cannot be zero".into()));
    }

    let id = payload.id;
    let outcome = handler.enqueue(payload).await?;
    Ok(Json(EnqueueResponse {
        id,
        duplicate: outcome == PutOutcome::Duplicate,
    }))
}

/// POST /api/v1/jobs/complete
async fn complete<H>(
    State(handler): State<Arc<H>>,
    Json(event): Json<TriggerEvent>,
) -> Result<impl IntoResponse, ApiError>
where
    H: TriggerHandler,
{
    let completion: JobCompletion = event.parse()?;
    let id = handler.complete(completion).await?;
    Ok(Json(CompleteResponse { id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header::CONTENT_TYPE};
    use ephem_core::error::CoreError;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingHandler {
        launched: Mutex<Vec<JobId>>,
        terminated: Mutex<Vec<JobId>>,
        enqueued: Mutex<Vec<JobId>>,
    }

    #[async_trait]
    impl TriggerHandler for RecordingHandler {
        async fn launch(&self, req: LaunchRequest) -> Result<(), ApiError> {
            if req.labels.contains("gpu") {
                return Err(CoreError::Routing {
                    action: "launch",
                    labels: req.labels,
                }
                .into());
            }
            self.launched.lock().unwrap().push(req.id);
            Ok(())
        }

        async fn terminate(&self, req: TerminationRequest) -> Result<(), ApiError> {
            self.terminated.lock().unwrap().push(req.id);
            Ok(())
        }

        async fn publish(&self) -> Result<Vec<CycleReport>, ApiError> {
            Ok(vec![CycleReport {
                host: "vm".into(),
                admitted: 2,
                reaped: 1,
                in_progress: 1,
            }])
        }

        async fn enqueue(&self, payload: JobPayload) -> Result<PutOutcome, ApiError> {
            let mut seen = self.enqueued.lock().unwrap();
            if seen.contains(&payload.id) {
                return Ok(PutOutcome::Duplicate);
            }
            seen.push(payload.id);
            Ok(PutOutcome::Inserted)
        }

        async fn complete(&self, event: JobCompletion) -> Result<Option<JobId>, ApiError> {
            Ok(Some(event.id))
        }
    }

    fn app(handler: Arc<RecordingHandler>) -> Router {
        HttpApi::new(handler).router()
    }

    fn post_event(uri: &str, event: &TriggerEvent) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(event).unwrap()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn launch_accepts_single_record() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single(
            r#"{"id":9,"owner":"acme","repository":"widgets","labels":["self-hosted","vm"]}"#,
        );

        let resp = app(handler.clone())
            .oneshot(post_event("/api/v1/launch", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(handler.launched.lock().unwrap().as_slice(), &[9]);
    }

    #[tokio::test]
    async fn multiple_records_are_rejected_without_side_effects() {
        let handler = Arc::new(RecordingHandler::default());
        let mut event = TriggerEvent::single(r#"{"id":1,"labels":["vm"]}"#);
        event.records.push(event.records[0].clone());

        let resp = app(handler.clone())
            .oneshot(post_event("/api/v1/terminate", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("received 2 records"));
        assert!(handler.terminated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn routing_miss_is_unprocessable() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single(
            r#"{"id":3,"owner":"acme","repository":"widgets","labels":["self-hosted","gpu"]}"#,
        );

        let resp = app(handler)
            .oneshot(post_event("/api/v1/launch", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(resp).await;
        assert_eq!(
            body["error"],
            "labels [self-hosted,gpu] launch currently is not supported"
        );
    }

    #[tokio::test]
    async fn malformed_record_body_is_bad_request() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single("{\"id\":");

        let resp = app(handler)
            .oneshot(post_event("/api/v1/terminate", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn publish_returns_host_reports() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single(r#"{"source":"publisher"}"#);

        let resp = app(handler)
            .oneshot(post_event("/api/v1/publish", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: PublishResponse = serde_json::from_value(json_body(resp).await).unwrap();
        assert_eq!(
            body.hosts,
            vec![CycleReport {
                host: "vm".into(),
                admitted: 2,
                reaped: 1,
                in_progress: 1,
            }]
        );
    }

    #[tokio::test]
    async fn enqueue_reports_duplicates() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single(
            r#"{"id":4,"owner":"acme","repository":"widgets","labels":["self-hosted","ubuntu","vm"]}"#,
        );

        let first = app(handler.clone())
            .oneshot(post_event("/api/v1/jobs", &event))
            .await
            .unwrap();
        let second = app(handler)
            .oneshot(post_event("/api/v1/jobs", &event))
            .await
            .unwrap();

        let first: EnqueueResponse = serde_json::from_value(json_body(first).await).unwrap();
        let second: EnqueueResponse = serde_json::from_value(json_body(second).await).unwrap();
        assert_eq!(first, EnqueueResponse { id: 4, duplicate: false });
        assert_eq!(second, EnqueueResponse { id: 4, duplicate: true });
    }

    #[tokio::test]
    async fn enqueue_rejects_zero_id() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single(r#"{"id":0,"owner":"a","repository":"b"}"#);

        let resp = app(handler.clone())
            .oneshot(post_event("/api/v1/jobs", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(handler.enqueued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn complete_echoes_marked_id() {
        let handler = Arc::new(RecordingHandler::default());
        let event = TriggerEvent::single(r#"{"id":12,"runner_name":null}"#);

        let resp = app(handler)
            .oneshot(post_event("/api/v1/jobs/complete", &event))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: CompleteResponse = serde_json::from_value(json_body(resp).await).unwrap();
        assert_eq!(body.id, Some(12));
    }
}
