use std::fmt;

use ephem_model::{Labels, SELF_HOSTED_LABEL};

use crate::backend::BackendRef;

/// One `(label set, backend)` pairing consulted by the [`LabelRouter`](super::LabelRouter).
///
/// - `labels`: the exact label set a job must request (marker label excluded) to be launched here.
///   Sorted and de-duplicated once at construction so lookups are binary searches.
/// - `host`: the backend key. It doubles as the discriminating label for termination routing
///   and as the job-store partition the publisher drains for this backend.
pub struct RouteTarget {
    host: String,
    labels: Vec<String>,
    backend: BackendRef,
}

impl RouteTarget {
    /// Create a target. The marker label is dropped from `labels` if present.
    pub fn new<I, S>(host: impl Into<String>, labels: I, backend: BackendRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .filter(|l| l != SELF_HOSTED_LABEL)
            .collect();
        labels.sort();
        labels.dedup();

        Self {
            host: host.into(),
            labels,
            backend,
        }
    }

    /// Backend key / termination discriminator.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sorted target labels.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[inline]
    pub fn backend(&self) -> &BackendRef {
        &self.backend
    }

    /// Exact-set launch policy.
    ///
    /// `labels` minus the marker must equal the target set: same members, same cardinality.
    /// Inputs whose length differs from `len(target) + 1` are rejected before any comparison.
    pub fn launch_matches(&self, labels: &Labels) -> bool {
        if labels.len() != self.labels.len() + 1 {
            return false;
        }

        let mut seen = vec![false; self.labels.len()];
        let mut matched = 0;
        for label in labels.iter() {
            if label == SELF_HOSTED_LABEL {
                continue;
            }
            match self.labels.binary_search_by(|t| t.as_str().cmp(label)) {
                Ok(i) if !seen[i] => {
                    seen[i] = true;
                    matched += 1;
                }
                _ => return false,
            }
        }
        matched == self.labels.len()
    }

    /// Membership termination policy: the discriminator appears anywhere in `labels`.
    pub fn termination_matches(&self, labels: &Labels) -> bool {
        labels.contains(&self.host)
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.host, self.labels.join(","))
    }
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTarget")
            .field("host", &self.host)
            .field("labels", &self.labels)
            .field("backend", &self.backend.name())
            .finish()
    }
}
