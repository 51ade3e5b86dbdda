use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{BusError, Message, NotificationBus, Transport, partition};

/// Maximum number of messages per transport call.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Body of the publisher re-trigger message.
pub const SELF_TRIGGER_BODY: &str = r#"{"source":"publisher"}"#;

/// Batching [`NotificationBus`] over a [`Transport`].
///
/// Job messages are split into chunks of `batch_size` and every chunk is published by its own
/// task. The first failing chunk cancels the chunks that have not been sent yet and becomes the
/// result; chunks that already went out are never re-sent.
pub struct Messenger<T: Transport> {
    transport: Arc<T>,
    jobs_topic: String,
    publisher_topic: String,
    batch_size: usize,
}

impl<T: Transport> Messenger<T> {
    pub fn new(
        transport: Arc<T>,
        jobs_topic: impl Into<String>,
        publisher_topic: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            jobs_topic: jobs_topic.into(),
            publisher_topic: publisher_topic.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the chunk size (0 is treated as 1).
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[async_trait]
impl<T: Transport> NotificationBus for Messenger<T> {
    #[instrument(level = "debug", skip_all, fields(topic = %self.jobs_topic, messages = messages.len()))]
    async fn send_batch(&self, messages: Vec<Message>) -> Result<(), BusError> {
        if messages.is_empty() {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let mut set = JoinSet::new();
        for chunk in partition(messages, self.batch_size) {
            let transport = Arc::clone(&self.transport);
            let topic = self.jobs_topic.clone();
            let cancel = cancel.child_token();
            set.spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(BusError::Canceled),
                    res = transport.publish_batch(&topic, &chunk) => res,
                }
            });
        }

        let mut first: Option<BusError> = None;
        while let Some(joined) = set.join_next().await {
            let res = joined.unwrap_or_else(|e| Err(BusError::Join(e.to_string())));
            if let Err(e) = res {
                if first.is_none() {
                    debug!(error = %e, "chunk delivery failed; canceling remaining chunks");
                    cancel.cancel();
                    first = Some(e);
                }
            }
        }

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn self_trigger(&self) -> Result<(), BusError> {
        self.transport
            .publish(&self.publisher_topic, SELF_TRIGGER_BODY.to_string())
            .await
    }
}
