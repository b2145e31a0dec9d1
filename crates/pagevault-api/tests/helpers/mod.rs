//! Test helpers: build the app against a temporary local storage directory.
//!
//! Run from workspace root: `cargo test -p pagevault-api`.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use pagevault_api::setup::build_app;
use pagevault_api::AppState;
use pagevault_core::{Config, ServiceConfig, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server, state, and the storage directory it owns.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
    pub storage_dir: PathBuf,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Every regular file under the storage directory.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(&self.storage_dir, &mut files);
        files
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

/// Local storage in a temp directory, no AI key (processing disabled).
pub fn create_test_config(storage_dir: &Path) -> Config {
    Config(Box::new(ServiceConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: storage_dir.display().to_string(),
        ..ServiceConfig::default()
    }))
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_dir = temp_dir.path().join("storage");
    let config = create_test_config(&storage_dir);

    let (state, app) = build_app(config).await.expect("Failed to build app");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
        storage_dir,
    }
}
