//! Application setup and initialization

pub mod processing;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::{SessionStore, UserStore};
use crate::state::AppState;
use anyhow::{Context, Result};
use pagevault_core::Config;
use pagevault_processing::FileValidator;
use std::sync::Arc;

/// Initialize the entire application: telemetry, then state and routes
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    build_app(config).await
}

/// Build state and router without touching global tracing
pub async fn build_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;
    tracing::info!(environment = %config.environment(), "Configuration loaded and validated successfully");

    let storage = storage::setup_storage(&config).await?;
    let (pipeline, dependencies) = processing::setup_processing(&config, storage.clone()).await?;

    let state = Arc::new(AppState {
        validator: FileValidator::from_config(&config),
        users: UserStore::new(),
        sessions: SessionStore::new(config.session_ttl_hours()),
        storage,
        pipeline,
        dependencies,
        config,
    });

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
