//! Configuration for the depot server

use depot_core::{DepotError, ServiceConfig};
use std::path::PathBuf;

/// Default cap on a single upload request body (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Depot server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name and HTTP bind settings
    pub service: ServiceConfig,
    /// Directory holding uploaded images
    pub upload_dir: PathBuf,
    /// Directory holding the per-channel log files
    pub log_dir: PathBuf,
    /// Largest accepted upload request body, in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, DepotError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DepotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = ServiceConfig::from_lookup(&lookup)?;
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .map_err(|e| DepotError::Config(format!("Invalid MAX_UPLOAD_BYTES: {}", e)))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            service,
            upload_dir: lookup("UPLOAD_DIR")
                .unwrap_or_else(|| "uploaded_images".to_string())
                .into(),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()).into(),
            max_upload_bytes,
        })
    }

    /// Create the storage directories if they do not exist yet
    pub async fn ensure_directories(&self) -> Result<(), DepotError> {
        for dir in [&self.upload_dir, &self.log_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                DepotError::Config(format!("Cannot create directory {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}
