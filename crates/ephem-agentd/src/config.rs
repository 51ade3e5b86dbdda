use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    path::Path,
    sync::Arc,
    time::Duration,
};

use ephem_core::{
    backend::BackendRef,
    bus::DEFAULT_BATCH_SIZE,
    error::CoreError,
    router::{LabelRouter, RouteTarget},
};
use ephem_exec::{
    ExecError,
    subprocess::{SubprocessBackend, SubprocessBackendConfig},
};
use ephem_model::{HostOption, ModelError};
use ephem_observe::LoggerConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid host option: {0}")]
    Host(#[from] ModelError),

    #[error("backend '{name}': {source}")]
    Backend { name: String, source: ExecError },

    #[error(transparent)]
    Router(#[from] CoreError),
}

/// Daemon configuration, loaded once from TOML at start-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Concurrency ceiling per backend key.
    #[serde(default)]
    pub hosts: Vec<HostOption>,
    /// Route table, in evaluation order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub backends: BTreeMap<String, SubprocessBackendConfig>,
    /// OS labels accepted by intake; the first one found among a job's labels is its OS.
    #[serde(default)]
    pub supported_os: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    /// Seconds between scheduled publish runs.
    pub interval_secs: u64,
    /// Seconds a self-trigger waits before the next run starts.
    pub wake_delay_secs: u64,
    /// Messages per transport call.
    pub batch_size: usize,
    pub jobs_topic: String,
    pub publisher_topic: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            wake_delay_secs: 10,
            batch_size: DEFAULT_BATCH_SIZE,
            jobs_topic: "jobs".to_string(),
            publisher_topic: "publisher".to_string(),
        }
    }
}

impl PublisherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn wake_delay(&self) -> Duration {
        Duration::from_secs(self.wake_delay_secs)
    }
}

/// One route target: jobs requesting exactly `labels` (plus the marker) launch on `backend`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Backend key; also the job-store partition and the termination discriminator.
    pub host: String,
    pub labels: Vec<String>,
    /// Name of an entry in `[backends]`.
    pub backend: String,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

impl AgentConfig {
    /// Read and parse a TOML file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Check cross-references and limits.
    ///
    /// Rules:
    /// - at least one host, every host option valid and unique;
    /// - every host has a route and every route host has a ceiling;
    /// - every route names a configured backend and every backend config is valid;
    /// - `supported_os` is not empty;
    /// - publisher interval and batch size are positive;
    /// - the route table passes [`LabelRouter::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::Invalid("no hosts configured".into()));
        }
        let mut seen = Vec::with_capacity(self.hosts.len());
        for opt in &self.hosts {
            opt.validate()?;
            if seen.contains(&opt.host.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "host '{}' configured twice",
                    opt.host
                )));
            }
            seen.push(opt.host.as_str());
        }

        for route in &self.routes {
            if !self.backends.contains_key(&route.backend) {
                return Err(ConfigError::Invalid(format!(
                    "route '{}' references unknown backend '{}'",
                    route.host, route.backend
                )));
            }
            if !seen.contains(&route.host.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "route '{}' has no host limit",
                    route.host
                )));
            }
        }
        for host in &seen {
            if !self.routes.iter().any(|r| r.host == *host) {
                return Err(ConfigError::Invalid(format!("host '{host}' has no route")));
            }
        }

        for (name, backend) in &self.backends {
            backend.validate().map_err(|source| ConfigError::Backend {
                name: name.clone(),
                source,
            })?;
        }

        if self.supported_os.is_empty() {
            return Err(ConfigError::Invalid("supported_os is empty".into()));
        }
        if self.publisher.interval_secs == 0 {
            return Err(ConfigError::Invalid("publisher interval must be positive".into()));
        }
        if self.publisher.batch_size == 0 {
            return Err(ConfigError::Invalid("publisher batch size must be positive".into()));
        }

        self.build_router()?.validate()?;
        Ok(())
    }

    /// Build the route table. Routes naming the same backend share one instance.
    pub fn build_router(&self) -> Result<LabelRouter, ConfigError> {
        let mut backends: HashMap<&str, BackendRef> = HashMap::new();
        let mut router = LabelRouter::new();

        for route in &self.routes {
            let backend = match backends.get(route.backend.as_str()) {
                Some(b) => Arc::clone(b),
                None => {
                    let cfg = self.backends.get(&route.backend).ok_or_else(|| {
                        ConfigError::Invalid(format!("unknown backend '{}'", route.backend))
                    })?;
                    let built: BackendRef = Arc::new(
                        SubprocessBackend::new(route.backend.clone(), cfg.clone()).map_err(
                            |source| ConfigError::Backend {
                                name: route.backend.clone(),
                                source,
                            },
                        )?,
                    );
                    backends.insert(&route.backend, Arc::clone(&built));
                    built
                }
            };
            router.register(RouteTarget::new(
                route.host.clone(),
                route.labels.iter().cloned(),
                backend,
            ));
        }
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephem_core::backend::Backend;

    const SAMPLE: &str = r#"
        listen = "0.0.0.0:9000"
        supported_os = ["ubuntu", "macos"]

        [logger]
        format = "json"

        [publisher]
        interval_secs = 15
        batch_size = 5

        [[hosts]]
        host = "vm"
        limit = 2

        [[hosts]]
        host = "pod"
        limit = 4

        [[routes]]
        host = "vm"
        labels = ["ubuntu", "vm"]
        backend = "local"

        [[routes]]
        host = "pod"
        labels = ["ubuntu", "pod"]
        backend = "local"

        [backends.local]
        program = "/opt/runner/run.sh"
        args = ["--ephemeral"]
    "#;

    fn sample() -> AgentConfig {
        AgentConfig::parse(SAMPLE).unwrap()
    }

    #[test]
    fn parses_full_file() {
        let cfg = sample();
        assert_eq!(cfg.listen, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(cfg.publisher.interval(), Duration::from_secs(15));
        assert_eq!(cfg.publisher.batch_size, 5);
        assert_eq!(cfg.publisher.jobs_topic, "jobs");
        assert_eq!(cfg.publisher.wake_delay(), Duration::from_secs(10));
        assert_eq!(cfg.hosts, vec![HostOption::new("vm", 2), HostOption::new("pod", 4)]);
        assert_eq!(cfg.routes.len(), 2);
        assert_eq!(cfg.backends["local"].args, vec!["--ephemeral"]);
        cfg.validate().unwrap();
    }

    #[test]
    fn builds_router_in_order() {
        let router = sample().build_router().unwrap();
        let hosts: Vec<_> = router.targets().iter().map(|t| t.host()).collect();
        assert_eq!(hosts, vec!["vm", "pod"]);
        assert_eq!(router.targets()[0].backend().name(), "local");
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let cfg = AgentConfig::parse("").unwrap();
        assert_eq!(cfg.listen, default_listen());
        assert_eq!(cfg.publisher.batch_size, DEFAULT_BATCH_SIZE);
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(AgentConfig::parse("workers = 3").is_err());
    }

    #[test]
    fn rejects_route_to_unknown_backend() {
        let mut cfg = sample();
        cfg.routes[1].backend = "cloud".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("unknown backend 'cloud'"));
    }

    #[test]
    fn rejects_host_without_route() {
        let mut cfg = sample();
        cfg.hosts.push(HostOption::new("mac", 1));
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("host 'mac' has no route"));
    }

    #[test]
    fn rejects_negative_limit() {
        let mut cfg = sample();
        cfg.hosts[0].limit = -1;
        assert!(matches!(cfg.validate(), Err(ConfigError::Host(_))));
    }

    #[test]
    fn rejects_duplicate_label_sets() {
        let mut cfg = sample();
        cfg.routes[1].labels = vec!["vm".into(), "ubuntu".into()];
        assert!(matches!(cfg.validate(), Err(ConfigError::Router(_))));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut cfg = sample();
        cfg.publisher.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_invalid_backend() {
        let mut cfg = sample();
        if let Some(local) = cfg.backends.get_mut("local") {
            local.program = " ".into();
        }
        assert!(matches!(cfg.validate(), Err(ConfigError::Backend { .. })));
    }
}
