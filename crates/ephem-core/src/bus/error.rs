use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("delivery canceled")]
    Canceled,

    #[error("delivery task failed: {0}")]
    Join(String),
}
