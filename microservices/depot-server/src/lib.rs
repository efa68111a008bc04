//! Depot Server
//!
//! HTTP service for two small storage concerns:
//! - Image store: uploads kept by filename in a flat directory
//! - Channel log: append-only, timestamped JSON records per integer channel,
//!   with lookup of the most recent record

pub mod channel_log;
pub mod config;
pub mod error;
pub mod handlers;
pub mod image_store;
pub mod repr;
pub mod routes;
pub mod server;
pub mod stats;

use depot_core::{DependencyStatus, HealthStatus, ReadinessStatus};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub use channel_log::{ChannelLog, LogRecord};
pub use config::Config;
pub use error::{Error, Result};
pub use image_store::ImageStore;
pub use server::DepotServer;
pub use stats::ServiceMetrics;

pub const SERVICE_ID: &str = "depot-server";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub images: Arc<ImageStore>,
    pub channels: Arc<ChannelLog>,
    pub metrics: Arc<ServiceMetrics>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            images: Arc::new(ImageStore::new(&config.upload_dir)),
            channels: Arc::new(ChannelLog::new(&config.log_dir)),
            metrics: Arc::new(ServiceMetrics::new()),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: SERVICE_ID.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_secs(),
        }
    }

    /// Ready once both storage roots exist as directories
    pub async fn ready(&self) -> ReadinessStatus {
        let dependencies = vec![
            Self::directory_status("upload_dir", self.images.root()).await,
            Self::directory_status("log_dir", self.channels.root()).await,
        ];

        ReadinessStatus {
            ready: dependencies.iter().all(|d| d.available),
            dependencies,
        }
    }

    async fn directory_status(name: &str, dir: &Path) -> DependencyStatus {
        let started = Instant::now();
        let available = tokio::fs::metadata(dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);

        DependencyStatus {
            name: name.to_string(),
            available,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        }
    }
}
