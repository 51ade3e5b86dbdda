use std::sync::Arc;

/// Result classification of a launch or termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend performed the change.
    Applied,
    /// The backend reported the desired state already held (idempotency sentinel).
    Absorbed,
    /// The request failed.
    Failed,
}

impl Outcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Applied => "applied",
            Outcome::Absorbed => "absorbed",
            Outcome::Failed => "failed",
        }
    }
}

/// Backend metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record the outcome of a launch request routed to `backend`.
    fn record_launch(&self, backend: &str, outcome: Outcome);
    /// Record the outcome of a termination request routed to `backend`.
    fn record_termination(&self, backend: &str, outcome: Outcome);
    /// Record a committed publish cycle for `host`.
    ///
    /// # Arguments
    /// - `admitted`: queued jobs marked in progress
    /// - `reaped`: completed jobs deleted
    fn record_cycle(&self, host: &str, admitted: usize, reaped: usize);
    /// Record a failed publish cycle for `host`.
    fn record_cycle_error(&self, host: &str);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
