use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    Host,
    error::{ModelError, ModelResult},
};

/// Concurrency ceiling for one backend.
///
/// `limit` bounds how many jobs of `host` may be in `queued` (about to launch) or `in_progress`
/// at the same time. The publisher reads at most `limit` completed jobs and
/// `limit + completed` active jobs per cycle.
///
/// Parsed from `host=limit` pairs (e.g. `"vm=5"`) when supplied through the environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOption {
    pub host: Host,
    pub limit: i32,
}

impl HostOption {
    pub fn new(host: impl Into<Host>, limit: i32) -> Self {
        Self {
            host: host.into(),
            limit,
        }
    }

    /// Checks that the host key is non-empty and the limit non-negative.
    pub fn validate(&self) -> ModelResult<()> {
        if self.host.trim().is_empty() {
            return Err(ModelError::InvalidHostOption("host cannot be empty".into()));
        }
        if self.limit < 0 {
            return Err(ModelError::InvalidHostOption(format!(
                "limit for host '{}' cannot be negative: {}",
                self.host, self.limit
            )));
        }
        Ok(())
    }
}

impl FromStr for HostOption {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let (host, limit) = s
            .split_once('=')
            .ok_or_else(|| ModelError::InvalidHostOption(format!("expected host=limit: {s}")))?;

        let limit = limit
            .trim()
            .parse::<i32>()
            .map_err(|e| ModelError::InvalidHostOption(format!("{s}: {e}")))?;

        let opt = HostOption::new(host.trim(), limit);
        opt.validate()?;
        Ok(opt)
    }
}

impl fmt::Display for HostOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.host, self.limit)
    }
}
