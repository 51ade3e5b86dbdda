//! Job store seam.
//!
//! The store is the only shared mutable resource of the publisher. It is partitioned by host and
//! supports bounded reads plus one atomic "mark in progress + delete" transaction per cycle.
mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryJobStore;

use async_trait::async_trait;
use ephem_model::{Host, Job, JobId, JobStatus};

/// Bounded read of one host partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetJobsInput {
    pub host: Host,
    pub statuses: Vec<JobStatus>,
    /// Maximum number of rows returned; non-positive reads nothing.
    pub limit: i32,
}

impl GetJobsInput {
    pub fn new(host: impl Into<Host>, statuses: impl Into<Vec<JobStatus>>, limit: i32) -> Self {
        Self {
            host: host.into(),
            statuses: statuses.into(),
            limit,
        }
    }
}

/// Status change for an existing row, conditional on the status it was read with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateJob {
    pub id: JobId,
    /// Status the row must still have when the transaction runs.
    pub expected: JobStatus,
    pub status: JobStatus,
}

/// One atomic transaction: apply every update and delete every ID, or change nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateJobsInput {
    pub update: Vec<UpdateJob>,
    pub delete: Vec<JobId>,
}

impl UpdateJobsInput {
    /// Admission commit: mark `queued` in progress, delete `completed`.
    ///
    /// A job that left `queued` after it was read (e.g. completed meanwhile) fails the whole
    /// commit, so the next cycle sees its current status.
    pub fn admit(queued: &[Job], completed: &[Job]) -> Self {
        Self {
            update: queued
                .iter()
                .map(|j| UpdateJob {
                    id: j.id,
                    expected: JobStatus::Queued,
                    status: JobStatus::InProgress,
                })
                .collect(),
            delete: completed.iter().map(|j| j.id).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.delete.is_empty()
    }
}

/// Result of a conditional insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// A row with the same ID already exists; nothing was written.
    Duplicate,
}

/// Queryable job table.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Read up to `limit` jobs of `host` whose status is one of `statuses`.
    async fn get_jobs(&self, input: GetJobsInput) -> Result<Vec<Job>, StoreError>;

    /// Apply the transaction atomically.
    ///
    /// Fails with [`StoreError::ConditionFailed`] and writes nothing when an update target is
    /// missing or no longer has its `expected` status.
    async fn update_jobs(&self, input: UpdateJobsInput) -> Result<(), StoreError>;

    /// Insert a job unless its ID is already present.
    async fn put_job(&self, job: Job) -> Result<PutOutcome, StoreError>;

    /// Mark an existing job completed.
    async fn set_completed(&self, id: JobId) -> Result<(), StoreError>;
}
