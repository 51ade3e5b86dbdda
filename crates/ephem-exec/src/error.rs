use thiserror::Error;

use ephem_core::backend::BackendError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),

    #[error("spawn failed: {0}")]
    Spawn(std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExecError> for BackendError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::InvalidConfig(msg) => BackendError::InvalidRequest(msg),
            ExecError::Spawn(e) => BackendError::Unavailable(format!("spawn failed: {e}")),
            ExecError::Io(e) => BackendError::Io(e.to_string()),
        }
    }
}
