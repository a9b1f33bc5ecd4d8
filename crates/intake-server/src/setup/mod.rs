//! Application setup and initialization
//!
//! Everything the binary does before it starts accepting connections.

pub mod server;
pub mod services;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use intake_core::{Config, FileEventHandler};

use crate::constants::SERVICE_NAME;

/// Initialize the application and return the handler the FTP adapter drives.
pub async fn initialize_app(config: &Config) -> Result<Arc<dyn FileEventHandler>> {
    intake_infra::init_telemetry(SERVICE_NAME, config.environment(), config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    tracing::info!(
        host = %host,
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    storage::prepare_upload_root(config).await?;

    let handler = services::initialize_services(config)?;

    Ok(handler)
}
