use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use ephem_model::HostOption;

/// Ephemeral CI worker fleet daemon.
#[derive(Parser, Debug)]
#[command(name = "ephem-agentd", version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "EPHEM_CONFIG", default_value = "ephem.toml")]
    pub config: PathBuf,

    /// HTTP listen address (overrides `listen`).
    #[arg(long, env = "EPHEM_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter expression (overrides `logger.level`).
    #[arg(long, env = "EPHEM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Concurrency ceilings as `host=limit` (replace `hosts`).
    #[arg(long = "host", env = "EPHEM_HOSTS", value_delimiter = ',')]
    pub hosts: Vec<HostOption>,
}
