//! Opaque job payload stored alongside each job row.
//!
//! On disk the payload is gzip-compressed JSON. The router and the publisher never look inside:
//! they move [`JobContent`] bytes from the store into notifications untouched. Only the edges
//! (intake and the launch/termination consumers) encode or decode it.
use std::io::{Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use serde::{Deserialize, Serialize};

use crate::{
    JobId, Labels,
    error::{ModelError, ModelResult},
    request::{LaunchRequest, TerminationRequest},
};

/// Error kind reported when the stored bytes are not valid gzip.
pub const INVALID_GZIP: &str = "invalid_gzip";
/// Error kind reported when the decompressed bytes are not a valid payload.
pub const INVALID_JSON: &str = "invalid_json";

/// Decoded job payload: everything needed to provision a worker for a job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub id: JobId,
    pub owner: String,
    pub repository: String,
    #[serde(default)]
    pub labels: Labels,
}

impl JobPayload {
    /// Build the launch request for this job.
    pub fn launch_request(&self) -> LaunchRequest {
        LaunchRequest {
            id: self.id,
            owner: self.owner.clone(),
            repository: self.repository.clone(),
            labels: self.labels.clone(),
        }
    }

    /// Build the termination request for this job.
    pub fn termination_request(&self) -> TerminationRequest {
        TerminationRequest {
            id: self.id,
            labels: self.labels.clone(),
        }
    }
}

/// Compressed, opaque job payload ("bytes in, bytes out").
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobContent(Vec<u8>);

impl JobContent {
    /// Wrap raw stored bytes without validating them.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Size of the compressed payload in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize and compress a payload.
    pub fn encode(payload: &JobPayload) -> ModelResult<Self> {
        let json = serde_json::to_vec(payload).map_err(|e| ModelError::Invalid(e.to_string()))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder
            .write_all(&json)
            .and_then(|_| encoder.finish())
            .map(Self)
            .map_err(|e| ModelError::Invalid(format!("failed to compress job content: {e}")))
    }

    /// Decompress and deserialize the payload.
    ///
    /// Fails with [`ModelError::InvalidContent`] (`invalid_gzip` / `invalid_json`).
    pub fn decode(&self) -> ModelResult<JobPayload> {
        let mut json = Vec::new();
        GzDecoder::new(self.0.as_slice())
            .read_to_end(&mut json)
            .map_err(|e| ModelError::InvalidContent {
                kind: INVALID_GZIP,
                reason: e.to_string(),
            })?;

        serde_json::from_slice(&json).map_err(|e| ModelError::InvalidContent {
            kind: INVALID_JSON,
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for JobContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JobContent({} bytes)", self.0.len())
    }
}
