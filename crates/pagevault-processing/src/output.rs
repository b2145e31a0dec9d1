//! Destinations for derived PDFs.

use pagevault_core::Config;
use pagevault_storage::keys::unique_filename;
use pagevault_storage::{Storage, StorageError};
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Key prefix for derived files written through the storage backend
pub const PROCESSED_PREFIX: &str = "processed";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output server request failed: {0}")]
    Remote(String),

    #[error("Output server returned status {0}")]
    RemoteStatus(u16),
}

#[derive(Clone)]
pub enum OutputTarget {
    Storage { storage: Arc<dyn Storage> },
    LocalDirectory { base: PathBuf },
    RemoteUrl { url: String, client: reqwest::Client },
}

impl std::fmt::Debug for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTarget::Storage { storage } => f
                .debug_struct("Storage")
                .field("backend", &storage.backend_type())
                .finish(),
            OutputTarget::LocalDirectory { base } => {
                f.debug_struct("LocalDirectory").field("base", base).finish()
            }
            OutputTarget::RemoteUrl { url, .. } => {
                f.debug_struct("RemoteUrl").field("url", url).finish()
            }
        }
    }
}

impl OutputTarget {
    pub fn remote(url: impl Into<String>, timeout: Duration) -> Result<Self, OutputError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OutputError::Remote(e.to_string()))?;
        Ok(OutputTarget::RemoteUrl {
            url: url.into(),
            client,
        })
    }

    /// Pick the sink: output server, then output directory, then storage.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, OutputError> {
        if let Some(url) = config.output_server_url() {
            return Self::remote(url, Duration::from_secs(config.output_timeout_secs()));
        }
        if let Some(dir) = config.output_dir() {
            return Ok(OutputTarget::LocalDirectory {
                base: PathBuf::from(dir),
            });
        }
        Ok(OutputTarget::Storage { storage })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutputTarget::Storage { .. } => "storage",
            OutputTarget::LocalDirectory { .. } => "local_directory",
            OutputTarget::RemoteUrl { .. } => "remote_url",
        }
    }

    /// Deliver a derived PDF and return where it ended up.
    pub async fn deliver(
        &self,
        owner_id: Uuid,
        folder: Option<&str>,
        source_name: &str,
        pdf: Vec<u8>,
    ) -> Result<String, OutputError> {
        let filename = output_filename(source_name);
        let folder = folder.and_then(sanitize_folder);
        let size = pdf.len();

        let locator = match self {
            OutputTarget::Storage { storage } => {
                let key = match folder.as_deref() {
                    Some(folder) => {
                        format!("{}/{}/{}/{}", PROCESSED_PREFIX, owner_id, folder, filename)
                    }
                    None => format!("{}/{}/{}", PROCESSED_PREFIX, owner_id, filename),
                };
                storage.upload_with_key(&key, pdf, "application/pdf").await?
            }
            OutputTarget::LocalDirectory { base } => {
                let dir = match folder.as_deref() {
                    Some(folder) => base.join(folder),
                    None => base.clone(),
                };
                tokio::fs::create_dir_all(&dir).await?;
                let path = dir.join(&filename);
                tokio::fs::write(&path, &pdf).await?;
                path.display().to_string()
            }
            OutputTarget::RemoteUrl { url, client } => {
                send_remote(client, url, &filename, folder.as_deref(), pdf).await?
            }
        };

        tracing::info!(
            target_kind = self.kind(),
            locator = %locator,
            size_bytes = size,
            "Derived PDF delivered"
        );

        Ok(locator)
    }
}

async fn send_remote(
    client: &reqwest::Client,
    url: &str,
    filename: &str,
    folder: Option<&str>,
    pdf: Vec<u8>,
) -> Result<String, OutputError> {
    let part = Part::bytes(pdf)
        .file_name(filename.to_string())
        .mime_str("application/pdf")
        .map_err(|e| OutputError::Remote(e.to_string()))?;
    let mut form = Form::new().part("file", part);
    if let Some(folder) = folder {
        form = form.text("folder_name", folder.to_string());
    }

    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| OutputError::Remote(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(OutputError::RemoteStatus(status.as_u16()));
    }

    // Servers that answer with {"url": ...} tell us where the file lives.
    let body = response.text().await.unwrap_or_default();
    let located = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("url").and_then(|u| u.as_str()).map(String::from));

    Ok(located.unwrap_or_else(|| url.to_string()))
}

/// `{safe_base}_{uuid}.pdf` derived from the source document name.
fn output_filename(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    unique_filename(&format!("{}.pdf", stem))
}

/// Keep `[A-Za-z0-9_-]`; `None` if nothing is left.
pub fn sanitize_folder(folder: &str) -> Option<String> {
    let cleaned: String = folder
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagevault_storage::LocalStorage;

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder("2024 Q1/../reports"), Some("2024Q1reports".to_string()));
        assert_eq!(sanitize_folder("team_a-b"), Some("team_a-b".to_string()));
        assert_eq!(sanitize_folder("../.."), None);
    }

    #[test]
    fn test_output_filename() {
        let name = output_filename("scan.png");
        assert!(name.starts_with("scan_"));
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_deliver_to_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::LocalDirectory {
            base: dir.path().to_path_buf(),
        };

        let locator = target
            .deliver(Uuid::new_v4(), Some("invoices"), "report.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        let path = PathBuf::from(&locator);
        assert!(path.starts_with(dir.path().join("invoices")));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_deliver_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> =
            Arc::new(LocalStorage::new(dir.path(), None).await.unwrap());
        let target = OutputTarget::Storage {
            storage: storage.clone(),
        };
        let owner = Uuid::new_v4();

        target
            .deliver(owner, None, "report.pdf", b"%PDF-1.4 derived".to_vec())
            .await
            .unwrap();

        let listed = storage
            .list(&format!("{}/{}", PROCESSED_PREFIX, owner))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].file_name().starts_with("report_"));
        assert_eq!(
            storage.download(&listed[0].key).await.unwrap(),
            b"%PDF-1.4 derived"
        );
    }

    #[tokio::test]
    async fn test_deliver_to_remote_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(mockito::Matcher::Regex("name=\"file\"".to_string()))
            .with_status(200)
            .with_body("{\"url\": \"https://files.example.com/report.pdf\"}")
            .create_async()
            .await;

        let target =
            OutputTarget::remote(format!("{}/upload", server.url()), Duration::from_secs(5))
                .unwrap();
        let locator = target
            .deliver(Uuid::new_v4(), None, "report.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(locator, "https://files.example.com/report.pdf");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(500)
            .create_async()
            .await;

        let target =
            OutputTarget::remote(format!("{}/upload", server.url()), Duration::from_secs(5))
                .unwrap();
        let result = target
            .deliver(Uuid::new_v4(), None, "report.pdf", b"%PDF-1.4".to_vec())
            .await;

        assert!(matches!(result, Err(OutputError::RemoteStatus(500))));
    }
}
