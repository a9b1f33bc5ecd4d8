//! Upload root preparation

use anyhow::{Context, Result};
use intake_core::constants::PLACEHOLDER_FILE_NAME;
use intake_core::Config;
use intake_processing::{sweep_stale_uploads, ListingOverride};

/// Create the upload root, clear files left by an earlier run and seed the
/// listing placeholder.
pub async fn prepare_upload_root(config: &Config) -> Result<()> {
    let root = config.upload_root();

    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("Failed to create upload root {}", root.display()))?;

    let removed = sweep_stale_uploads(root, PLACEHOLDER_FILE_NAME)
        .await
        .context("Failed to sweep stale uploads")?;

    ListingOverride::default()
        .ensure_placeholder(root)
        .await
        .context("Failed to create listing placeholder")?;

    tracing::info!(
        upload_root = %root.display(),
        stale_removed = removed,
        "Upload root ready"
    );
    Ok(())
}
