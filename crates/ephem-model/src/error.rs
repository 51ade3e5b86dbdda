use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown job status: {0}")]
    UnknownStatus(String),

    /// Stored job content could not be decoded.
    ///
    /// This is a permanent data-corruption condition: retrying the same row yields the same failure.
    #[error("{kind}: {reason}")]
    InvalidContent { kind: &'static str, reason: String },

    #[error("invalid host option: {0}")]
    InvalidHostOption(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

impl ModelError {
    /// Returns `true` for failures caused by malformed stored content.
    pub fn is_invalid_content(&self) -> bool {
        matches!(self, ModelError::InvalidContent { .. })
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
