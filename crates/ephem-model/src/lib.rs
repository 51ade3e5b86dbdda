mod domain;
pub use domain::{Host, JobId, Labels, parse_runner_name, runner_name};
pub use domain::{RUNNER_NAME_SEPARATOR, SELF_HOSTED_LABEL};

mod error;
pub use error::{ModelError, ModelResult};

mod job;
pub use job::{INVALID_GZIP, INVALID_JSON, Job, JobContent, JobPayload, JobStatus};

mod request;
pub use request::{LaunchRequest, TerminationRequest};

mod admission;
pub use admission::HostOption;
