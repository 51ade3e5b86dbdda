use thiserror::Error;

use ephem_model::{Labels, ModelError};

use crate::{backend::BackendError, bus::BusError, store::StoreError};

#[derive(Debug, Error)]
pub enum CoreError {
    /// No configured route target matches the labels. Terminal for the request.
    #[error("labels {labels} {action} currently is not supported")]
    Routing {
        action: &'static str,
        labels: Labels,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("notification error: {0}")]
    Bus(#[from] BusError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("operation canceled")]
    Canceled,

    #[error("task join error: {0}")]
    Join(String),
}

impl CoreError {
    /// Returns `true` when repeating the same request cannot succeed.
    ///
    /// Routing misses, configuration errors and corrupted job content are permanent;
    /// store, bus and backend failures are treated as transient.
    pub fn is_permanent(&self) -> bool {
        match self {
            CoreError::Routing { .. } | CoreError::Config(_) => true,
            CoreError::Model(e) => e.is_invalid_content(),
            _ => false,
        }
    }
}
