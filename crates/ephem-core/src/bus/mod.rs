//! Notification bus seam.
//!
//! The publisher hands one batch of [`Message`]s per host cycle to a [`NotificationBus`] and asks
//! it for a best-effort self-trigger. [`Messenger`] is the batching implementation that sits on
//! top of a raw [`Transport`].
mod error;
pub use error::BusError;

mod message;
pub use message::Message;

mod partition;
pub use partition::partition;

mod messenger;
pub use messenger::{DEFAULT_BATCH_SIZE, Messenger, SELF_TRIGGER_BODY};

use async_trait::async_trait;

/// Batched delivery to job consumers plus the publisher re-trigger channel.
#[async_trait]
pub trait NotificationBus: Send + Sync {
    /// Deliver all messages. Partial delivery is possible on error; delivered messages stay sent.
    async fn send_batch(&self, messages: Vec<Message>) -> Result<(), BusError>;

    /// Ask for another publish run.
    async fn self_trigger(&self) -> Result<(), BusError>;
}

/// Raw topic-based delivery (a queue service, an in-process channel).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Publish one chunk of messages to `topic`.
    async fn publish_batch(&self, topic: &str, messages: &[Message]) -> Result<(), BusError>;

    /// Publish a single raw body to `topic`.
    async fn publish(&self, topic: &str, body: String) -> Result<(), BusError>;
}
