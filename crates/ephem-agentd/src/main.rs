mod cli;
mod config;
mod dispatch;
mod metrics;
mod transport;

use std::sync::Arc;

use clap::Parser;
use tokio::{net::TcpListener, sync::Notify, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ephem_api::{HttpApi, ServiceAdapter};
use ephem_core::prelude::*;
use ephem_observe::init_logger;
use ephem_prometheus::PrometheusMetrics;

use crate::{
    cli::Cli,
    config::AgentConfig,
    dispatch::{Dispatcher, run_publisher},
    transport::LocalTransport,
};

/// Deliveries buffered between the publisher and the local dispatcher.
const DELIVERY_CAPACITY: usize = 1024;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) configuration
    let cli = Cli::parse();
    let mut cfg = AgentConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        cfg.listen = listen;
    }
    if let Some(level) = cli.log_level {
        cfg.logger = cfg.logger.with_level(level.parse()?);
    }
    if !cli.hosts.is_empty() {
        cfg.hosts = cli.hosts;
    }
    cfg.validate()?;

    // 2) logger
    init_logger(&cfg.logger)?;
    info!(
        config = %cli.config.display(),
        hosts = cfg.hosts.len(),
        routes = cfg.routes.len(),
        "configuration loaded"
    );

    // 3) metrics + core services
    let metrics = PrometheusMetrics::new()?;
    let handle: MetricsHandle = Arc::new(metrics.clone());

    let router = Arc::new(cfg.build_router()?);
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());

    let (transport, deliveries) = LocalTransport::channel(
        &cfg.publisher.jobs_topic,
        &cfg.publisher.publisher_topic,
        DELIVERY_CAPACITY,
    );
    let bus = Arc::new(
        Messenger::new(
            Arc::new(transport),
            &cfg.publisher.jobs_topic,
            &cfg.publisher.publisher_topic,
        )
        .with_batch_size(cfg.publisher.batch_size),
    );

    let publisher = Arc::new(
        Publisher::new(cfg.hosts.clone(), Arc::clone(&store), bus).with_metrics(handle.clone()),
    );
    let launcher = Arc::new(LaunchService::new(Arc::clone(&router)).with_metrics(handle.clone()));
    let terminator =
        Arc::new(TerminationService::new(Arc::clone(&router)).with_metrics(handle.clone()));
    let intake = Arc::new(JobIntake::new(router, store, cfg.supported_os.clone()));

    // 4) background loops
    let cancel = CancellationToken::new();
    let wake = Arc::new(Notify::new());
    let mut tasks = JoinSet::new();

    let dispatcher = Dispatcher::new(
        Arc::clone(&launcher),
        Arc::clone(&terminator),
        Arc::clone(&wake),
    );
    tasks.spawn(dispatcher.run(deliveries, cancel.clone()));
    tasks.spawn(run_publisher(
        Arc::clone(&publisher),
        cfg.publisher.interval(),
        cfg.publisher.wake_delay(),
        wake,
        cancel.clone(),
    ));

    // 5) http
    let adapter = Arc::new(
        ServiceAdapter::new(launcher, terminator, publisher, intake).with_cancel(cancel.clone()),
    );
    let app = HttpApi::new(adapter)
        .router()
        .merge(metrics::router(metrics));

    let listener = TcpListener::bind(cfg.listen).await?;
    info!(listen = %cfg.listen, "http api listening");

    tokio::spawn(shutdown_on_ctrl_c(cancel.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await?;

    // 6) drain
    cancel.cancel();
    while let Some(res) = tasks.join_next().await {
        res?;
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_on_ctrl_c(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c");
        return;
    }
    info!("ctrl-c received, shutting down");
    cancel.cancel();
}
