//! Label router that maps a job's labels to exactly one compute backend.
//!
//! One ordered table serves two policies:
//! - launch uses exact-set matching (see [`RouteTarget::launch_matches`]);
//! - termination only needs the backend type and matches on the discriminating label.
//!
//! All targets are evaluated on every call and the *last* match wins. Overlapping targets are
//! therefore not an error at routing time; [`LabelRouter::validate`] rejects them up front.
mod target;
pub use target::RouteTarget;

use ephem_model::Labels;
use tracing::trace;

use crate::error::CoreError;

/// Ordered, immutable-after-setup route table.
#[derive(Default)]
pub struct LabelRouter {
    targets: Vec<RouteTarget>,
}

impl LabelRouter {
    /// Create an empty router.
    #[inline]
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    /// Append a target. Configuration order is evaluation order.
    #[inline]
    pub fn register(&mut self, target: RouteTarget) {
        self.targets.push(target);
    }

    /// Builder-style [`register`](Self::register).
    #[inline]
    pub fn with_target(mut self, target: RouteTarget) -> Self {
        self.register(target);
        self
    }

    pub fn targets(&self) -> &[RouteTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Select the launch target for `labels` (last exact-set match wins).
    pub fn route_launch(&self, labels: &Labels) -> Result<&RouteTarget, CoreError> {
        self.last_match(labels, RouteTarget::launch_matches)
            .ok_or_else(|| CoreError::Routing {
                action: "launch",
                labels: labels.clone(),
            })
    }

    /// Select the termination target for `labels` (last discriminator match wins).
    pub fn route_termination(&self, labels: &Labels) -> Result<&RouteTarget, CoreError> {
        self.last_match(labels, RouteTarget::termination_matches)
            .ok_or_else(|| CoreError::Routing {
                action: "termination",
                labels: labels.clone(),
            })
    }

    /// Resolve the job-store partition (host key) for a job with `labels`.
    pub fn host_for(&self, labels: &Labels) -> Result<&str, CoreError> {
        self.route_termination(labels).map(RouteTarget::host)
    }

    /// Returns `true` if a target with this host key is registered.
    pub fn contains_host(&self, host: &str) -> bool {
        self.targets.iter().any(|t| t.host() == host)
    }

    /// Reject tables where two targets could claim the same job.
    ///
    /// Two launch sets overlap under exact-set matching only when they are equal;
    /// two targets sharing a host key make termination routing ambiguous.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (i, a) in self.targets.iter().enumerate() {
            for b in &self.targets[i + 1..] {
                if a.labels() == b.labels() {
                    return Err(CoreError::Config(format!(
                        "route targets {a} and {b} match the same label set"
                    )));
                }
                if a.host() == b.host() {
                    return Err(CoreError::Config(format!(
                        "route targets {a} and {b} share host key '{}'",
                        a.host()
                    )));
                }
            }
        }
        Ok(())
    }

    fn last_match(
        &self,
        labels: &Labels,
        matches: fn(&RouteTarget, &Labels) -> bool,
    ) -> Option<&RouteTarget> {
        let mut picked = None;
        for target in &self.targets {
            if matches(target, labels) {
                trace!(target = %target, labels = %labels, "route target matched");
                picked = Some(target);
            }
        }
        picked
    }
}
