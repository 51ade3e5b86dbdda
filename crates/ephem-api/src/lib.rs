//! Event-trigger surface of the fleet.
//!
//! Every invocation carries a [`TriggerEvent`] with exactly one record; the record body is the
//! JSON request. [`HttpApi`] mounts one route per operation on top of a [`TriggerHandler`].
mod error;
pub use error::ApiError;

mod event;
pub use event::{TriggerEvent, TriggerRecord};

mod handler;
pub use handler::TriggerHandler;

mod adapter;
pub use adapter::ServiceAdapter;

mod http;
pub use http::{CompleteResponse, EnqueueResponse, HttpApi, PublishResponse};
