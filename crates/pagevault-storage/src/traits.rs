//! The backend-neutral storage interface used by handlers and the pipeline.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked object body returned by [`Storage::download_stream`]
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// One entry of a namespace listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl StoredObject {
    /// Last path segment of the key
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Object storage keyed by `/`-separated strings.
///
/// Reads go straight to the backend; a successful `upload` is visible to the
/// next `list` under the same prefix.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store under `uploads/{owner_id}/{filename}`; returns `(key, locator)`.
    ///
    /// `filename` becomes the last key segment unchanged, so callers pass a
    /// name from [`crate::keys::unique_filename`].
    async fn upload(
        &self,
        owner_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Store at an explicit key and return its locator.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Chunked read for large responses
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Idempotent: a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Object size in bytes; `NotFound` when absent.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Objects under `prefix` (e.g. `uploads/{owner_id}`), sorted by key.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>>;

    fn backend_type(&self) -> StorageBackend;
}
