use crate::metrics::backend::{MetricsBackend, Outcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_launch(&self, _: &str, _: Outcome) {}

    #[inline(always)]
    fn record_termination(&self, _: &str, _: Outcome) {}

    #[inline(always)]
    fn record_cycle(&self, _: &str, _: usize, _: usize) {}

    #[inline(always)]
    fn record_cycle_error(&self, _: &str) {}
}
