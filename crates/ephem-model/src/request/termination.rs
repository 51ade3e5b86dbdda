use serde::{Deserialize, Serialize};

use crate::{JobId, Labels};

/// Request to tear down the worker of a previously launched job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRequest {
    pub id: JobId,
    /// Job labels; only the backend discriminator among them matters for routing.
    #[serde(default)]
    pub labels: Labels,
}
