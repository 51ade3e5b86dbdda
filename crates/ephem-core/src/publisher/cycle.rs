use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ephem_model::{HostOption, Job, JobStatus};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    bus::{Message, NotificationBus},
    error::CoreError,
    metrics::MetricsHandle,
    store::{GetJobsInput, JobStore, UpdateJobsInput},
};

/// Summary of one committed host cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub host: String,
    /// Queued jobs marked in progress.
    pub admitted: usize,
    /// Completed jobs deleted.
    pub reaped: usize,
    /// In-progress jobs observed (never touched).
    pub in_progress: usize,
}

impl CycleReport {
    fn idle(host: &str) -> Self {
        Self {
            host: host.to_string(),
            ..Default::default()
        }
    }
}

/// Jobs read for one host in one cycle.
#[derive(Debug, Default)]
pub(super) struct Slices {
    pub completed: Vec<Job>,
    pub queued: Vec<Job>,
    pub in_progress: Vec<Job>,
}

impl Slices {
    fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.queued.is_empty() && self.in_progress.is_empty()
    }

    fn has_transitions(&self) -> bool {
        !self.completed.is_empty() || !self.queued.is_empty()
    }
}

/// One host's read → notify → commit sequence.
pub(super) struct HostCycle {
    pub opt: HostOption,
    pub store: Arc<dyn JobStore>,
    pub bus: Arc<dyn NotificationBus>,
    pub metrics: MetricsHandle,
    /// Set once this host observed any job; read by the publisher to decide on a self-trigger.
    pub observed: Arc<AtomicBool>,
}

impl HostCycle {
    #[instrument(level = "debug", skip_all, fields(host = %self.opt.host, limit = self.opt.limit))]
    pub async fn run(self, cancel: CancellationToken) -> Result<CycleReport, CoreError> {
        let slices = self.read(&cancel).await?;

        if slices.is_empty() {
            debug!(host = %self.opt.host, "no jobs");
            return Ok(CycleReport::idle(&self.opt.host));
        }
        self.observed.store(true, Ordering::Release);

        let mut report = CycleReport {
            host: self.opt.host.clone(),
            in_progress: slices.in_progress.len(),
            ..Default::default()
        };

        if !slices.has_transitions() {
            debug!(
                host = %self.opt.host,
                in_progress = report.in_progress,
                "only in-progress jobs; nothing to notify"
            );
            return Ok(report);
        }

        info!(
            host = %self.opt.host,
            queued = ?ids(&slices.queued),
            completed = ?ids(&slices.completed),
            "processing jobs"
        );

        let messages: Vec<Message> = slices
            .completed
            .iter()
            .chain(slices.queued.iter())
            .map(Message::from_job)
            .collect();
        until_cancelled(&cancel, self.bus.send_batch(messages)).await?;

        // Notifications are out; from here the commit runs to completion.
        self.store
            .update_jobs(UpdateJobsInput::admit(&slices.queued, &slices.completed))
            .await?;

        report.admitted = slices.queued.len();
        report.reaped = slices.completed.len();
        self.metrics
            .record_cycle(&self.opt.host, report.admitted, report.reaped);
        Ok(report)
    }

    async fn read(&self, cancel: &CancellationToken) -> Result<Slices, CoreError> {
        info!(host = %self.opt.host, limit = self.opt.limit, "retrieving jobs");

        let completed = until_cancelled(
            cancel,
            self.store.get_jobs(GetJobsInput::new(
                self.opt.host.clone(),
                [JobStatus::Completed],
                self.opt.limit,
            )),
        )
        .await?;

        let freed = i32::try_from(completed.len()).unwrap_or(i32::MAX);
        let active = until_cancelled(
            cancel,
            self.store.get_jobs(GetJobsInput::new(
                self.opt.host.clone(),
                JobStatus::ACTIVE,
                self.opt.limit.saturating_add(freed),
            )),
        )
        .await?;

        let mut slices = Slices {
            completed,
            ..Default::default()
        };
        for job in active {
            match job.status {
                JobStatus::Queued => slices.queued.push(job),
                JobStatus::InProgress => slices.in_progress.push(job),
                JobStatus::Completed => {}
            }
        }
        Ok(slices)
    }
}

async fn until_cancelled<T, E, F>(cancel: &CancellationToken, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<CoreError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CoreError::Canceled),
        res = fut => res.map_err(Into::into),
    }
}

fn ids(jobs: &[Job]) -> Vec<u64> {
    jobs.iter().map(|j| j.id).collect()
}
