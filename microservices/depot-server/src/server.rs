//! Service lifecycle for the depot server

use async_trait::async_trait;
use depot_core::{DepotService, HealthStatus, ReadinessStatus, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::info;

use crate::{routes, AppState, Config, SERVICE_ID};

pub struct DepotServer {
    state: AppState,
    shutdown: Arc<Notify>,
}

impl DepotServer {
    /// Prepare storage directories and shared state
    pub async fn new(config: Config) -> Result<Self> {
        config.ensure_directories().await?;
        info!(
            upload_dir = %config.upload_dir.display(),
            log_dir = %config.log_dir.display(),
            max_upload_bytes = config.max_upload_bytes,
            "Storage directories ready"
        );

        Ok(Self {
            state: AppState::new(config),
            shutdown: Arc::new(Notify::new()),
        })
    }
}

#[async_trait]
impl DepotService for DepotServer {
    fn service_id(&self) -> &'static str {
        SERVICE_ID
    }

    async fn health(&self) -> HealthStatus {
        self.state.health()
    }

    async fn ready(&self) -> ReadinessStatus {
        self.state.ready().await
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down depot server");
        self.shutdown.notify_one();
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let bind_addr = self.state.config.service.bind_address()?;
        let listener = TcpListener::bind(bind_addr).await?;
        info!(bind = %bind_addr, "Depot server listening");

        let app = routes::create_router(self.state.clone());
        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await?;

        Ok(())
    }
}
