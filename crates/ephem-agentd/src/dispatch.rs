//! Local consumers of the notification topics.
//!
//! [`Dispatcher`] plays the launch/termination consumers: every job message is decoded and handed
//! to the orchestrator matching its status, on its own task. Wake-ups are forwarded to the
//! publisher loop ([`run_publisher`]).
use std::{sync::Arc, time::Duration};

use ephem_core::{
    bus::Message,
    error::CoreError,
    orchestrator::{LaunchService, TerminationService},
    publisher::Publisher,
};
use ephem_model::JobStatus;
use tokio::{
    sync::{Notify, mpsc},
    task::JoinSet,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::transport::Delivery;

#[derive(Clone)]
pub struct Dispatcher {
    launcher: Arc<LaunchService>,
    terminator: Arc<TerminationService>,
    wake: Arc<Notify>,
}

impl Dispatcher {
    pub fn new(
        launcher: Arc<LaunchService>,
        terminator: Arc<TerminationService>,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            launcher,
            terminator,
            wake,
        }
    }

    /// Consume deliveries until `cancel` fires or every sender is gone.
    ///
    /// Handlers already running are awaited before returning.
    pub async fn run(self, mut rx: mpsc::Receiver<Delivery>, cancel: CancellationToken) {
        let mut handlers = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(res) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = res {
                        error!(error = %e, "dispatch task failed");
                    }
                }
                delivery = rx.recv() => match delivery {
                    Some(Delivery::Wake) => self.wake.notify_one(),
                    Some(Delivery::Job(message)) => {
                        let this = self.clone();
                        handlers.spawn(async move { this.dispatch(message).await });
                    }
                    None => break,
                },
            }
        }

        while let Some(res) = handlers.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "dispatch task failed");
            }
        }
        debug!("dispatcher stopped");
    }

    /// Handle one job message, logging the failure.
    pub async fn dispatch(&self, message: Message) {
        if let Err(e) = self.handle(&message).await {
            if e.is_permanent() {
                error!(id = %message.dedup_id, host = %message.host, error = %e, "dropping job message");
            } else {
                warn!(id = %message.dedup_id, host = %message.host, error = %e, "job message failed");
            }
        }
    }

    async fn handle(&self, message: &Message) -> Result<(), CoreError> {
        let payload = message.body.decode()?;
        match message.status {
            JobStatus::Queued => self.launcher.launch(&payload.launch_request()).await,
            JobStatus::Completed => {
                self.terminator
                    .terminate(&payload.termination_request())
                    .await
            }
            JobStatus::InProgress => {
                debug!(id = payload.id, "in-progress job needs no action");
                Ok(())
            }
        }
    }
}

/// Run `publish` on every interval tick and after every wake-up until `cancel` fires.
///
/// A wake-up waits `wake_delay` first so consecutive self-triggers are spaced out. Failed runs
/// are logged; the loop keeps going.
pub async fn run_publisher(
    publisher: Arc<Publisher>,
    interval: Duration,
    wake_delay: Duration,
    wake: Arc<Notify>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(hosts = publisher.hosts().len(), ?interval, "publisher loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => debug!("scheduled publish"),
            _ = wake.notified() => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(wake_delay) => debug!("self-triggered publish"),
                }
            }
        }

        match publisher.publish(&cancel).await {
            Ok(reports) => debug!(hosts = reports.len(), "publish run finished"),
            Err(CoreError::Canceled) if cancel.is_cancelled() => break,
            Err(e) => error!(error = %e, "publish run failed"),
        }
    }
    info!("publisher loop stopped");
}
