//! In-process [`Transport`]: topics are channels into the local dispatcher.
use async_trait::async_trait;
use ephem_core::bus::{BusError, Message, Transport};
use tokio::sync::mpsc;
use tracing::trace;

/// What the dispatcher receives.
#[derive(Debug)]
pub enum Delivery {
    /// A job notification from the jobs topic.
    Job(Message),
    /// A publisher re-trigger.
    Wake,
}

pub struct LocalTransport {
    jobs_topic: String,
    publisher_topic: String,
    tx: mpsc::Sender<Delivery>,
}

impl LocalTransport {
    /// Create the transport and the receiving end for the dispatcher.
    pub fn channel(
        jobs_topic: impl Into<String>,
        publisher_topic: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let transport = Self {
            jobs_topic: jobs_topic.into(),
            publisher_topic: publisher_topic.into(),
            tx,
        };
        (transport, rx)
    }

    async fn deliver(&self, delivery: Delivery) -> Result<(), BusError> {
        self.tx
            .send(delivery)
            .await
            .map_err(|_| BusError::Transport("dispatcher is gone".into()))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn publish_batch(&self, topic: &str, messages: &[Message]) -> Result<(), BusError> {
        if topic != self.jobs_topic {
            return Err(BusError::Transport(format!("unknown jobs topic '{topic}'")));
        }
        for message in messages {
            trace!(id = %message.dedup_id, status = %message.status, "delivering");
            self.deliver(Delivery::Job(message.clone())).await?;
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, body: String) -> Result<(), BusError> {
        if topic != self.publisher_topic {
            return Err(BusError::Transport(format!(
                "topic '{topic}' does not accept raw bodies"
            )));
        }
        trace!(%body, "publisher wake-up");
        self.deliver(Delivery::Wake).await
    }
}
