use thiserror::Error;

use ephem_model::JobId;

/// Errors reported by a [`Backend`](super::Backend).
///
/// `AlreadyExists` and `NotExists` are idempotency signals: the desired end state already holds.
/// Orchestrators absorb them; every other variant is a real failure.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("worker id: {id} backend: {backend} already exists")]
    AlreadyExists { id: JobId, backend: String },

    #[error("worker id: {id} backend: {backend} not exists")]
    NotExists { id: JobId, backend: String },

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(String),
}

impl BackendError {
    pub fn already_exists(id: JobId, backend: impl Into<String>) -> Self {
        BackendError::AlreadyExists {
            id,
            backend: backend.into(),
        }
    }

    pub fn not_exists(id: JobId, backend: impl Into<String>) -> Self {
        BackendError::NotExists {
            id,
            backend: backend.into(),
        }
    }

    #[inline]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, BackendError::AlreadyExists { .. })
    }

    #[inline]
    pub fn is_not_exists(&self) -> bool {
        matches!(self, BackendError::NotExists { .. })
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e.to_string())
    }
}
