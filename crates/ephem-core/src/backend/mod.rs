//! Compute backend abstraction.
//!
//! A backend provisions and tears down one worker per job ID (a VM, a pod, a local process).
//! Backends are plugged into the [`LabelRouter`](crate::router::LabelRouter) through route targets;
//! the core never inspects which concrete backend it holds.
mod error;
pub use error::BackendError;

use std::sync::Arc;

use async_trait::async_trait;
use ephem_model::{JobId, LaunchRequest};

/// Launch/terminate capability of one compute platform.
///
/// Implementations own their identity lookups: before creating anything, `launch` must check
/// whether a worker tagged with the job ID already exists and report
/// [`BackendError::AlreadyExists`]; `terminate` reports [`BackendError::NotExists`] when there is
/// nothing to remove.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name used in logs, errors and metrics.
    fn name(&self) -> &str;

    /// Provision a worker for the request.
    async fn launch(&self, req: &LaunchRequest) -> Result<(), BackendError>;

    /// Tear down the worker for the job ID.
    async fn terminate(&self, id: JobId) -> Result<(), BackendError>;
}

/// Shared handle to a backend.
pub type BackendRef = Arc<dyn Backend>;
