mod labels;
pub use labels::Labels;

mod constants;
pub use constants::{RUNNER_NAME_SEPARATOR, SELF_HOSTED_LABEL};

/// Job identifier assigned upstream by the job producer.
///
/// Globally unique; used as the idempotency key for launch and termination.
pub type JobId = u64;

/// Backend key a job is partitioned by (e.g. `"vm"`, `"pod"`).
pub type Host = String;

/// Build the worker name for a job: `{prefix}-{id}`.
pub fn runner_name(prefix: &str, id: JobId) -> String {
    format!("{prefix}{RUNNER_NAME_SEPARATOR}{id}")
}

/// Recover the job ID from a worker name built by [`runner_name`].
///
/// Only the last separator-delimited segment is considered, so prefixes may contain the separator.
pub fn parse_runner_name(name: &str) -> Option<JobId> {
    name.rsplit(RUNNER_NAME_SEPARATOR)
        .next()
        .and_then(|s| s.trim().parse::<JobId>().ok())
        .filter(|id| *id != 0)
}
