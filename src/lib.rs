pub mod alerts;
pub mod clock;
pub mod commands;
pub mod config;
pub mod hardware;
pub mod models;
pub mod monitor;
pub mod presence;
pub mod service;
pub mod status;
pub mod vision;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use alerts::LogChannel;
use clock::SystemClock;
use config::ServiceConfig;
use service::MonitoringService;
use vision::NoopDetector;

pub struct AppState {
    pub service: MonitoringService,
}

/// Builds the service from the environment and runs it until Ctrl-C.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("carewatch starting up...");

    let config = ServiceConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    let result = runtime.block_on(async move {
        let state = AppState {
            service: MonitoringService::new(
                config,
                Arc::new(NoopDetector),
                Arc::new(LogChannel),
                Arc::new(SystemClock),
            ),
        };

        state.service.start_monitor().await?;

        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for shutdown signal")?;

        state.service.shutdown().await?;
        info!("carewatch stopped");
        Ok::<(), anyhow::Error>(())
    });

    // A hardware or detector call stuck in a blocking worker must not hold the process.
    runtime.shutdown_timeout(Duration::from_secs(5));
    result
}
