//! Job producer side: turns CI "job queued" and "job completed" events into store rows.
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ephem_model::{Job, JobContent, JobId, JobPayload, JobStatus, parse_runner_name};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::CoreError,
    router::LabelRouter,
    store::{JobStore, PutOutcome, StoreError},
};

/// "Job completed" event.
///
/// `runner_name` is the name of the worker that actually ran the job; when present it wins over
/// `id`, because a worker may have picked up a different job than the one it was launched for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCompletion {
    pub id: JobId,
    #[serde(default)]
    pub runner_name: Option<String>,
}

pub struct JobIntake {
    router: Arc<LabelRouter>,
    store: Arc<dyn JobStore>,
    supported_os: Vec<String>,
}

impl JobIntake {
    pub fn new(router: Arc<LabelRouter>, store: Arc<dyn JobStore>, supported_os: Vec<String>) -> Self {
        Self {
            router,
            store,
            supported_os,
        }
    }

    /// Store a queued job.
    ///
    /// The host comes from the router's termination policy; the OS is the first job label listed
    /// as supported. A job ID that is already stored is left untouched.
    #[instrument(level = "debug", skip(self, payload), fields(id = payload.id))]
    pub async fn enqueue(&self, payload: JobPayload) -> Result<PutOutcome, CoreError> {
        let host = self.router.host_for(&payload.labels)?.to_string();
        let os = payload
            .labels
            .iter()
            .find(|l| self.supported_os.iter().any(|os| os == *l))
            .map(str::to_string)
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "no supported OS found in labels {}",
                    payload.labels
                ))
            })?;

        let job = Job {
            id: payload.id,
            host,
            os,
            status: JobStatus::Queued,
            content: JobContent::encode(&payload)?,
            created_at_ms: now_ms(),
        };

        let outcome = self.store.put_job(job).await?;
        match outcome {
            PutOutcome::Inserted => info!(id = payload.id, labels = %payload.labels, "job queued"),
            PutOutcome::Duplicate => debug!(id = payload.id, "job already stored"),
        }
        Ok(outcome)
    }

    /// Mark a job completed so the publisher reaps its worker.
    ///
    /// Returns the ID that was marked, or `None` when the event was ignored (unparseable runner
    /// name, or no such job).
    #[instrument(level = "debug", skip(self, event), fields(id = event.id))]
    pub async fn complete(&self, event: JobCompletion) -> Result<Option<JobId>, CoreError> {
        let id = match event.runner_name.as_deref() {
            None | Some("") => event.id,
            Some(name) => match parse_runner_name(name) {
                Some(id) => id,
                None => {
                    warn!(runner_name = name, "cannot parse job id from runner name");
                    return Ok(None);
                }
            },
        };

        match self.store.set_completed(id).await {
            Ok(()) => {
                info!(id, "job completed");
                Ok(Some(id))
            }
            Err(StoreError::NotFound(_)) => {
                debug!(id, "completed job is not stored");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
