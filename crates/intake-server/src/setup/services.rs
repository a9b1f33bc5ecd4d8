//! Service initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use intake_core::{Config, FileEventHandler};
use intake_infra::RateLimiter;
use intake_processing::{IntakeHandler, ListingOverride, RemoteUploader, UploadPipeline};
use intake_services::{build_notifier, UploadThingClient};

/// Build the upload pipeline and wrap it in the FTP event handler.
pub fn initialize_services(config: &Config) -> Result<Arc<dyn FileEventHandler>> {
    let limiter = RateLimiter::with_shards(
        config.upload_rate_limit(),
        config.upload_rate_window(),
        config.rate_limiter_shard_count(),
    );
    tracing::info!(
        limit = limiter.limit(),
        window_secs = limiter.window().as_secs(),
        "Upload rate limiter initialized"
    );

    let uploader = UploadThingClient::from_config(config)
        .context("Failed to initialize UploadThing client")?
        .map(|client| Arc::new(client) as Arc<dyn RemoteUploader>);

    let notifier = build_notifier(config).context("Failed to initialize notifier")?;

    let pipeline = UploadPipeline::new(limiter, uploader, notifier);
    Ok(Arc::new(IntakeHandler::new(
        pipeline,
        ListingOverride::default(),
    )))
}
