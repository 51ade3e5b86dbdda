use serde::{Deserialize, Serialize};

/// Ordered label sequence attached to a CI job (e.g. `["self-hosted", "ubuntu", "vm"]`).
///
/// Order is preserved exactly as received from upstream; matching is order-insensitive.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(pub Vec<String>);

impl Labels {
    /// Create an empty label sequence.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if no labels are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of labels, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if `label` occurs anywhere in the sequence.
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    /// Iterate over labels in their original order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    /// Append a label.
    pub fn push(&mut self, label: impl Into<String>) -> &mut Self {
        self.0.push(label.into());
        self
    }

    /// Comma-joined representation used in logs and worker environment.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl<S: Into<String>> FromIterator<S> for Labels {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Labels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.joined())
    }
}
