//! depot server entry point.
//!
//! Loads configuration, opens the persistent store, installs and activates
//! the current generation, then serves the controller's tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use depot_client::{Controller, FetchClient, FetchConfig};
use depot_core::{AppConfig, CacheDb, CacheSettings};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let settings = CacheSettings::from_config(&config)?;

    tracing::info!(
        generation = %settings.generation,
        origin = %settings.origin,
        db_path = %config.db_path.display(),
        "Starting depot server on stdio transport"
    );

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config))?);
    let controller = Arc::new(Controller::new(settings, storage, network));

    let report = controller.start().await;
    tracing::info!(
        cached = report.cached.len(),
        failed = report.failed.len(),
        state = ?controller.lifecycle().state(),
        "startup install finished"
    );

    let handler = handler::DepotServer::new(controller);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
