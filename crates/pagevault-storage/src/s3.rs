use crate::keys::generate_storage_key;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload};
use std::time::Instant;
use uuid::Uuid;

/// Bucket-backed storage through `object_store`.
///
/// Credentials come from the standard `AWS_*` environment variables. Set an
/// endpoint for S3-compatible providers such as MinIO; plain `http://`
/// endpoints are allowed for local setups.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

fn location(key: &str) -> Path {
    Path::from(key.trim_end_matches('/'))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Map a missing object to `NotFound` and anything else through `other`.
fn classify(
    key: &str,
    err: object_store::Error,
    other: fn(String) -> StorageError,
) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
        e => other(e.to_string()),
    }
}

impl S3Storage {
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&bucket)
            .with_region(&region);

        if let Some(endpoint) = endpoint_url.as_deref() {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Virtual-hosted URL on AWS, path-style URL on a custom endpoint.
    fn locator(&self, key: &str) -> String {
        match self.endpoint_url.as_deref() {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        let size = data.len();
        let start = Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        object_store::ObjectStore::put_opts(
            &self.store,
            &location(key),
            PutPayload::from(Bytes::from(data)),
            opts,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = elapsed_ms(start),
                "S3 put failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = elapsed_ms(start),
            "S3 object written"
        );

        Ok(self.locator(key))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        owner_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let key = generate_storage_key(owner_id, filename);
        let locator = self.put(&key, data, content_type).await?;
        Ok((key, locator))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.put(storage_key, data, content_type).await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let start = Instant::now();

        let bytes = async {
            self.store
                .get(&location(storage_key))
                .await?
                .bytes()
                .await
        }
        .await
        .map_err(|e| classify(storage_key, e, StorageError::DownloadFailed))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len(),
            duration_ms = elapsed_ms(start),
            "S3 object read"
        );

        Ok(bytes.to_vec())
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let object = self
            .store
            .get(&location(storage_key))
            .await
            .map_err(|e| classify(storage_key, e, StorageError::DownloadFailed))?;

        let key = storage_key.to_string();
        let stream = object.into_stream().map(move |chunk| {
            chunk.map_err(|e| {
                tracing::error!(key = %key, error = %e, "S3 stream interrupted");
                StorageError::DownloadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        match self.store.delete(&location(storage_key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                tracing::info!(bucket = %self.bucket, key = %storage_key, "S3 object deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 delete failed"
                );
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        match self.content_length(storage_key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.store
            .head(&location(storage_key))
            .await
            .map(|meta| meta.size)
            .map_err(|e| classify(storage_key, e, StorageError::BackendError))
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let start = Instant::now();
        let prefix_path = location(prefix);

        let listing = object_store::ObjectStore::list(&self.store, Some(&prefix_path));
        let mut objects: Vec<StoredObject> = listing
            .map_ok(|meta| StoredObject {
                key: meta.location.to_string(),
                size: meta.size,
                last_modified: Some(meta.last_modified),
            })
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, prefix = %prefix, "S3 list failed");
                StorageError::BackendError(e.to_string())
            })?;
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = objects.len(),
            duration_ms = elapsed_ms(start),
            "S3 prefix listed"
        );

        Ok(objects)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
