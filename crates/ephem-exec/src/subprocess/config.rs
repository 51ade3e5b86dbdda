use std::{collections::BTreeMap, path::PathBuf, process::Stdio};

use ephem_model::{LaunchRequest, runner_name};
use serde::Deserialize;
use tokio::process::Command;

use crate::ExecError;

pub const ENV_RUNNER_NAME: &str = "RUNNER_NAME";
pub const ENV_RUNNER_LABELS: &str = "RUNNER_LABELS";
pub const ENV_RUNNER_ORG: &str = "RUNNER_ORG";
pub const ENV_RUNNER_REPO: &str = "RUNNER_REPO";
pub const ENV_RUNNER_ID: &str = "RUNNER_ID";

/// How to start one worker process.
///
/// The worker receives the job identity through `RUNNER_*` environment variables; `env` entries
/// are applied first and cannot override them.
#[derive(Debug, Clone, Deserialize)]
pub struct SubprocessBackendConfig {
    /// Program to execute (e.g. `"/opt/runner/run.sh"`).
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory; inherited when `None`.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Worker name prefix; the worker is named `<prefix>-<id>`.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

fn default_name_prefix() -> String {
    "ephem-runner".to_string()
}

impl SubprocessBackendConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            name_prefix: default_name_prefix(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the configuration.
    ///
    /// Rules:
    /// - `program` is not empty or whitespace-only;
    /// - `name_prefix` is not empty and has no whitespace;
    /// - `env` does not try to set a `RUNNER_*` identity variable.
    pub fn validate(&self) -> Result<(), ExecError> {
        if self.program.trim().is_empty() {
            return Err(ExecError::InvalidConfig("program is empty".into()));
        }
        if self.name_prefix.is_empty() || self.name_prefix.chars().any(char::is_whitespace) {
            return Err(ExecError::InvalidConfig(format!(
                "invalid name prefix '{}'",
                self.name_prefix
            )));
        }
        let reserved = [
            ENV_RUNNER_NAME,
            ENV_RUNNER_LABELS,
            ENV_RUNNER_ORG,
            ENV_RUNNER_REPO,
            ENV_RUNNER_ID,
        ];
        if let Some(key) = self.env.keys().find(|k| reserved.contains(&k.as_str())) {
            return Err(ExecError::InvalidConfig(format!(
                "env key '{key}' is reserved"
            )));
        }
        Ok(())
    }

    /// Worker name for a job.
    pub fn worker_name(&self, id: u64) -> String {
        runner_name(&self.name_prefix, id)
    }

    /// Build the command for one job. Output is piped so it can be forwarded to the log.
    pub fn command(&self, req: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.env)
            .env(ENV_RUNNER_NAME, self.worker_name(req.id))
            .env(ENV_RUNNER_LABELS, req.labels.joined())
            .env(ENV_RUNNER_ORG, &req.owner)
            .env(ENV_RUNNER_REPO, &req.repository)
            .env(ENV_RUNNER_ID, req.id.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}
