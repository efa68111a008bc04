//! Depot Server binary
//!
//! Image upload/download and per-channel record logs over HTTP.

use depot_core::MicroserviceRuntime;
use depot_server::{Config, DepotServer};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    depot_telemetry::init(depot_server::SERVICE_ID)?;

    info!("Starting depot server");

    let config = Config::from_env()?;
    let server = Arc::new(DepotServer::new(config).await?);
    MicroserviceRuntime::run(server).await?;

    Ok(())
}
