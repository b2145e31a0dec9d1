//! Route configuration and setup.

mod health;

use crate::auth::middleware::session_middleware;
use crate::handlers::{auth, files, process};
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use pagevault_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Headroom over the file size limit for multipart framing and form fields
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        session_middleware,
    ));

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1_000)
        .max(1);

    // Oversized bodies are cut off here; the validator reports exact sizes
    // for anything that gets through.
    let body_limit = config
        .max_file_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let app = public_routes()
        .merge(protected_routes)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state.clone());

    tracing::info!(http_concurrency_limit, body_limit, "Routes configured");

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/health", get(health::health_check))
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(files::upload_file))
        .route("/files", get(files::list_files))
        .route("/download/{filename}", get(files::download_file))
        .route("/delete/{filename}", get(files::delete_file))
        .route("/upload_pdf", post(process::process_document))
        .route("/api/upload", post(files::upload_file))
        .route("/api/files", get(files::list_files))
        .route("/api/download/{filename}", get(files::download_file))
        .route("/api/delete/{filename}", delete(files::api_delete_file))
        .route("/api/process", post(process::process_document))
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(true)
    };
    Ok(cors)
}
