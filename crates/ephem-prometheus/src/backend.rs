use std::sync::Arc;

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder, proto::MetricFamily};

use ephem_core::metrics::{MetricsBackend, Outcome};

/// Prometheus metrics backend.
///
/// ## Label cardinality
/// - `backend`: one value per configured route target
/// - `host`: one value per configured host option
/// - `outcome`: "applied", "absorbed", "failed"
#[derive(Clone)]
pub struct PrometheusMetrics {
    launches: CounterVec,
    terminations: CounterVec,
    admitted: CounterVec,
    reaped: CounterVec,
    cycle_errors: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create the backend and register its collectors in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let counter = |name: &str, help: &str, labels: &[&str]| -> Result<CounterVec, prometheus::Error> {
            let c = CounterVec::new(Opts::new(name, help), labels)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        Ok(Self {
            launches: counter(
                "ephem_launches_total",
                "Launch requests by backend and outcome",
                &["backend", "outcome"],
            )?,
            terminations: counter(
                "ephem_terminations_total",
                "Termination requests by backend and outcome",
                &["backend", "outcome"],
            )?,
            admitted: counter(
                "ephem_jobs_admitted_total",
                "Queued jobs admitted (marked in progress)",
                &["host"],
            )?,
            reaped: counter(
                "ephem_jobs_reaped_total",
                "Completed jobs deleted after teardown notification",
                &["host"],
            )?,
            cycle_errors: counter(
                "ephem_publish_cycle_errors_total",
                "Failed publish cycles",
                &["host"],
            )?,
            registry,
        })
    }

    /// Create the backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metric families.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format, ready to be served on `/metrics`.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_launch(&self, backend: &str, outcome: Outcome) {
        self.launches
            .with_label_values(&[backend, outcome.as_label()])
            .inc();
    }

    fn record_termination(&self, backend: &str, outcome: Outcome) {
        self.terminations
            .with_label_values(&[backend, outcome.as_label()])
            .inc();
    }

    fn record_cycle(&self, host: &str, admitted: usize, reaped: usize) {
        self.admitted
            .with_label_values(&[host])
            .inc_by(admitted as f64);
        self.reaped.with_label_values(&[host]).inc_by(reaped as f64);
    }

    fn record_cycle_error(&self, host: &str) {
        self.cycle_errors.with_label_values(&[host]).inc();
    }
}
