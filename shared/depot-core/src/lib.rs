//! Depot Core - Shared domain types and service infrastructure
//!
//! This crate provides:
//! - Standard service trait the depot server implements
//! - Domain types (ChannelId, ImageName)
//! - Error handling utilities
//! - Configuration management

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use domain::*;
pub use error::{DepotError, Result};
pub use service::{DepotService, DependencyStatus, HealthStatus, MicroserviceRuntime, ReadinessStatus};
