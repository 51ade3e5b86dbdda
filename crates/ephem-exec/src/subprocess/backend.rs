use std::collections::HashMap;

use async_trait::async_trait;
use tokio::{process::Child, sync::Mutex};
use tracing::{debug, info, instrument, warn};

use ephem_core::backend::{Backend, BackendError};
use ephem_model::{JobId, LaunchRequest};

use super::{
    SubprocessBackendConfig,
    output::{LogConfig, Stream, forward},
};
use crate::ExecError;

/// [`Backend`] that runs each worker as a local child process.
///
/// Identity lookup is the in-memory child table:
/// - launch of an ID whose child is still running → `AlreadyExists`;
/// - terminate of an unknown ID, or of a child that already exited → `NotExists`.
pub struct SubprocessBackend {
    name: String,
    config: SubprocessBackendConfig,
    log: LogConfig,
    children: Mutex<HashMap<JobId, Child>>,
}

impl SubprocessBackend {
    /// Create a backend after validating `config`.
    pub fn new(name: impl Into<String>, config: SubprocessBackendConfig) -> Result<Self, ExecError> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            log: LogConfig::default(),
            children: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn config(&self) -> &SubprocessBackendConfig {
        &self.config
    }

    /// Number of tracked workers that are still running.
    pub async fn running(&self) -> usize {
        let mut children = self.children.lock().await;
        prune_exited(&mut children);
        children.len()
    }

    fn spawn(&self, req: &LaunchRequest) -> Result<Child, ExecError> {
        let mut child = self.config.command(req).spawn().map_err(ExecError::Spawn)?;

        if let Some(out) = child.stdout.take() {
            tokio::spawn(forward(out, req.id, Stream::Stdout, self.log));
        }
        if let Some(err) = child.stderr.take() {
            tokio::spawn(forward(err, req.id, Stream::Stderr, self.log));
        }
        Ok(child)
    }
}

#[async_trait]
impl Backend for SubprocessBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip(self, req), fields(backend = %self.name, id = req.id))]
    async fn launch(&self, req: &LaunchRequest) -> Result<(), BackendError> {
        let mut children = self.children.lock().await;

        // Workers may exit without a matching terminate.
        prune_exited(&mut children);
        if children.contains_key(&req.id) {
            return Err(BackendError::already_exists(req.id, &self.name));
        }

        let child = self.spawn(req)?;
        info!(
            id = req.id,
            pid = child.id(),
            worker = %self.config.worker_name(req.id),
            "worker launched"
        );
        children.insert(req.id, child);
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(backend = %self.name))]
    async fn terminate(&self, id: JobId) -> Result<(), BackendError> {
        let Some(mut child) = self.children.lock().await.remove(&id) else {
            return Err(BackendError::not_exists(id, &self.name));
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(id, %status, "worker already exited");
                Err(BackendError::not_exists(id, &self.name))
            }
            Ok(None) => {
                if let Err(e) = child.kill().await {
                    warn!(id, error = %e, "failed to kill worker");
                    return Err(ExecError::Io(e).into());
                }
                info!(id, "worker terminated");
                Ok(())
            }
            Err(e) => Err(ExecError::Io(e).into()),
        }
    }
}

/// Reap and forget children that already exited. Children whose state cannot be read stay.
fn prune_exited(children: &mut HashMap<JobId, Child>) {
    children.retain(|id, child| match child.try_wait() {
        Ok(Some(status)) => {
            debug!(id, %status, "worker exited");
            false
        }
        Ok(None) => true,
        Err(e) => {
            warn!(id, error = %e, "cannot read worker state");
            true
        }
    });
}
