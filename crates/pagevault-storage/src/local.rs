use crate::keys::generate_storage_key;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Files under a base directory, one file per key.
///
/// Writes land in a hidden temporary file that is renamed into place, so a
/// listing never shows a partially written upload.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    /// Public URL the base directory is served under; locators are
    /// filesystem paths without it.
    base_url: Option<String>,
}

/// `NotFound` for a missing path, `other` for any other I/O failure.
fn io_error(key: &str, err: std::io::Error, other: fn(String) -> StorageError) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        other(format!("{}: {}", key, err))
    }
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>, base_url: Option<String>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key below the base directory.
    ///
    /// Keys must be relative, `/`-separated and free of `..`; an existing
    /// path that resolves outside the base (through a symlink) is rejected.
    fn resolve(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let lexically_bad = storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.contains(['\\', '\0']);
        let relative = Path::new(storage_key);
        if lexically_bad
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }

        let path = self.base_path.join(relative);
        if let Ok(real) = std::fs::canonicalize(&path) {
            let base = std::fs::canonicalize(&self.base_path)
                .map_err(|e| StorageError::ConfigError(format!("Storage base unusable: {}", e)))?;
            if !real.starts_with(&base) {
                return Err(StorageError::InvalidKey(storage_key.to_string()));
            }
        }

        Ok(path)
    }

    fn locator(&self, key: &str, path: &Path) -> String {
        match self.base_url.as_deref() {
            Some(base_url) => format!("{}/{}", base_url.trim_end_matches('/'), key),
            None => path.display().to_string(),
        }
    }

    /// Write to `.{name}.partial` next to the target, fsync, then rename.
    async fn write_atomic(&self, key: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.resolve(key)?;
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(StorageError::InvalidKey(key.to_string()));
        };
        fs::create_dir_all(parent).await?;

        let partial = parent.join(format!(".{}.partial", name.to_string_lossy()));
        let write = async {
            let mut file = fs::File::create(&partial).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&partial, &path).await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::UploadFailed(format!("{}: {}", key, e)));
        }

        Ok(path)
    }

    /// Key for a file below the base directory, with `/` separators
    fn key_for(&self, path: &Path) -> Option<String> {
        let parts = path
            .strip_prefix(&self.base_path)
            .ok()?
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        owner_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = generate_storage_key(owner_id, filename);
        let locator = self.upload_with_key(&key, data, content_type).await?;
        Ok((key, locator))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let start = Instant::now();
        let path = self.write_atomic(storage_key, &data).await?;

        tracing::info!(
            key = %storage_key,
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File written"
        );

        Ok(self.locator(storage_key, &path))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(storage_key)?;
        let data = fs::read(&path)
            .await
            .map_err(|e| io_error(storage_key, e, StorageError::DownloadFailed))?;

        tracing::debug!(key = %storage_key, size_bytes = data.len(), "File read");
        Ok(data)
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let path = self.resolve(storage_key)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| io_error(storage_key, e, StorageError::DownloadFailed))?;

        let key = storage_key.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |chunk| {
            chunk.map_err(|e| {
                tracing::error!(key = %key, error = %e, "File stream interrupted");
                StorageError::DownloadFailed(format!("{}: {}", key, e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.resolve(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %storage_key, "File deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!("{}: {}", storage_key, e))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.resolve(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.resolve(storage_key)?;
        fs::metadata(&path)
            .await
            .map(|meta| meta.len())
            .map_err(|e| io_error(storage_key, e, StorageError::BackendError))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let root = self.resolve(prefix.trim_end_matches('/'))?;
        let mut objects = Vec::new();

        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // An owner without uploads has no directory yet
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StorageError::BackendError(format!(
                        "{}: {}",
                        dir.display(),
                        e
                    )))
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if !file_type.is_file() || hidden {
                    continue;
                }
                let Some(key) = self.key_for(&path) else {
                    tracing::warn!(path = %path.display(), "Skipping non UTF-8 path");
                    continue;
                };
                let meta = entry.metadata().await?;
                objects.push(StoredObject {
                    key,
                    size: meta.len(),
                    last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        tracing::debug!(prefix = %prefix, count = objects.len(), "Prefix listed");

        Ok(objects)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
