use std::collections::HashMap;

use async_trait::async_trait;
use ephem_model::{Job, JobId, JobStatus};
use tokio::sync::RwLock;
use tracing::trace;

use super::{GetJobsInput, JobStore, PutOutcome, StoreError, UpdateJobsInput};

/// In-process job table guarded by one lock.
///
/// Every transaction takes the write lock for its whole duration, which gives it the same
/// all-or-nothing visibility a conditional multi-row write has on a real table.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `jobs` (later duplicates replace earlier ones).
    pub fn with_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self {
            jobs: RwLock::new(jobs.into_iter().map(|j| (j.id, j)).collect()),
        }
    }

    /// Look up one job.
    pub async fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Number of rows.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_jobs(&self, input: GetJobsInput) -> Result<Vec<Job>, StoreError> {
        let Ok(limit) = usize::try_from(input.limit) else {
            return Ok(Vec::new());
        };

        let jobs = self.jobs.read().await;
        let mut out: Vec<Job> = jobs
            .values()
            .filter(|j| j.host == input.host && input.statuses.contains(&j.status))
            .cloned()
            .collect();
        out.sort_by_key(|j| (j.created_at_ms, j.id));
        out.truncate(limit);

        trace!(host = %input.host, limit = input.limit, found = out.len(), "jobs read");
        Ok(out)
    }

    async fn update_jobs(&self, input: UpdateJobsInput) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;

        for u in &input.update {
            match jobs.get(&u.id) {
                None => {
                    return Err(StoreError::ConditionFailed(format!(
                        "job {} does not exist",
                        u.id
                    )));
                }
                Some(job) if job.status != u.expected => {
                    return Err(StoreError::ConditionFailed(format!(
                        "job {} is {}, expected {}",
                        u.id, job.status, u.expected
                    )));
                }
                Some(_) => {}
            }
        }

        for u in &input.update {
            if let Some(job) = jobs.get_mut(&u.id) {
                job.status = u.status;
            }
        }
        for id in &input.delete {
            jobs.remove(id);
        }
        Ok(())
    }

    async fn put_job(&self, job: Job) -> Result<PutOutcome, StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Ok(PutOutcome::Duplicate);
        }
        jobs.insert(job.id, job);
        Ok(PutOutcome::Inserted)
    }

    async fn set_completed(&self, id: JobId) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        job.status = JobStatus::Completed;
        Ok(())
    }
}
