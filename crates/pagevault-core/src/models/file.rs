use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file accepted by the upload handler and written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub original_filename: String,
    /// Collision-resistant name the file is stored under (`{base}_{uuid}{.ext}`)
    pub stored_filename: String,
    pub storage_key: String,
    pub size: u64,
    pub content_type: String,
    /// Public URL or filesystem path, depending on the backend
    pub locator: String,
}

/// Listing view of a stored object in a user's namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub original_filename: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}
