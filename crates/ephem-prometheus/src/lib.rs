//! Prometheus metrics backend for the fleet core.
//!
//! [`PrometheusMetrics`] implements [`ephem_core::metrics::MetricsBackend`] and is injected into the
//! orchestrators and the publisher with `with_metrics`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use ephem_core::metrics::{MetricsBackend, Outcome};
//! use ephem_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: Arc<dyn MetricsBackend> = Arc::new(metrics.clone());
//! handle.record_launch("vm", Outcome::Applied);
//!
//! let body = metrics.render()?;
//! assert!(body.contains("ephem_launches_total"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `ephem_launches_total{backend, outcome}` - Counter
//! - `ephem_terminations_total{backend, outcome}` - Counter
//! - `ephem_jobs_admitted_total{host}` - Counter
//! - `ephem_jobs_reaped_total{host}` - Counter
//! - `ephem_publish_cycle_errors_total{host}` - Counter
//!
//! This crate does not serve `/metrics`; the daemon mounts [`PrometheusMetrics::render`] on its
//! HTTP router.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
