use anyhow::{Context, Result};
use pagevault_core::Config;
use pagevault_storage::{create_storage, Storage};
use std::sync::Arc;

/// Create the configured storage backend
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    match config.storage_backend() {
        pagevault_core::StorageBackend::S3 => tracing::info!(
            backend = "s3",
            bucket = config.s3_bucket().unwrap_or_default(),
            endpoint = config.s3_endpoint().unwrap_or("aws"),
            "Storage initialized"
        ),
        pagevault_core::StorageBackend::Local => tracing::info!(
            backend = "local",
            path = %config.local_storage_path(),
            "Storage initialized"
        ),
    }

    Ok(storage)
}
