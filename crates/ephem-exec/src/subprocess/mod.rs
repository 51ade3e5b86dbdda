//! Subprocess worker backend.
//!
//! Every launched job gets one child process running the configured runner program. The child is
//! tracked by job ID, which is what makes launch and terminate idempotent.
mod config;
pub use config::{
    ENV_RUNNER_ID, ENV_RUNNER_LABELS, ENV_RUNNER_NAME, ENV_RUNNER_ORG, ENV_RUNNER_REPO,
    SubprocessBackendConfig,
};

mod output;
pub use output::LogConfig;

mod backend;
pub use backend::SubprocessBackend;
