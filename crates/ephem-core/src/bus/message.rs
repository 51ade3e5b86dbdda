use ephem_model::{Host, Job, JobContent, JobStatus};

/// Outbound notification for one job.
///
/// `body` is the job content exactly as stored; routing metadata travels alongside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub host: Host,
    pub os: String,
    pub status: JobStatus,
    /// Job ID as a string; consumers drop repeated IDs.
    pub dedup_id: String,
    pub body: JobContent,
}

impl Message {
    pub fn from_job(job: &Job) -> Self {
        Self {
            host: job.host.clone(),
            os: job.os.clone(),
            status: job.status,
            dedup_id: job.id.to_string(),
            body: job.content.clone(),
        }
    }
}
