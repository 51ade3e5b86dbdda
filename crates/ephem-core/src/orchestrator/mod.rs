//! Single-request orchestrators.
//!
//! Each service routes one inbound request through the [`LabelRouter`](crate::router::LabelRouter),
//! calls the selected backend and absorbs the idempotency sentinels:
//! - launch: [`BackendError::AlreadyExists`](crate::backend::BackendError::AlreadyExists) → success;
//! - termination: [`BackendError::NotExists`](crate::backend::BackendError::NotExists) → success.
//!
//! Redelivering the same request is therefore always safe.
mod launch;
pub use launch::LaunchService;

mod termination;
pub use termination::TerminationService;
