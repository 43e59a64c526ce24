#![allow(missing_docs)]

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use job_harvester::api::{self, AppState};
use job_harvester::domain::JobRepository;
use job_harvester::infrastructure::{
    AppConfig, InMemoryJobRepository, MySqlJobRepository, init_logging_with_config,
};
use job_harvester::HarvestService;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    info!("Starting job-harvester v{}", env!("CARGO_PKG_VERSION"));

    let repository = connect_repository(&config).await?;
    let harvests = HarvestService::new(Arc::new(config.clone()), repository);
    let app = api::router(AppState::new(harvests));

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

async fn connect_repository(config: &AppConfig) -> Result<Arc<dyn JobRepository>> {
    if config.database.url.trim().is_empty() {
        warn!("No database URL configured, harvested jobs are kept in memory only");
        return Ok(Arc::new(InMemoryJobRepository::new()));
    }

    let repository = MySqlJobRepository::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    repository
        .migrate()
        .await
        .context("Failed to prepare ems_jobs table")?;
    Ok(Arc::new(repository))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
