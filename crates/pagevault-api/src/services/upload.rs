//! Validate-then-store flow shared by the upload handlers

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::MultipartUpload;
use pagevault_core::models::UploadedFile;
use pagevault_storage::keys::unique_filename;
use uuid::Uuid;

/// Validate an upload and return the content type to store it with.
///
/// Size is checked before anything else. Nothing is written here.
pub fn validate_upload(state: &AppState, upload: &MultipartUpload) -> Result<String, HttpAppError> {
    let validator = &state.validator;
    validator.validate_file_size(upload.data.len())?;

    let content_type =
        validator.resolve_content_type(&upload.filename, upload.content_type.as_deref());
    validator.validate_all(&upload.filename, &content_type, upload.data.len())?;

    Ok(content_type)
}

/// Validate and store an upload in the owner's namespace.
pub async fn store_upload(
    state: &AppState,
    owner_id: Uuid,
    upload: MultipartUpload,
) -> Result<UploadedFile, HttpAppError> {
    let content_type = match validate_upload(state, &upload) {
        Ok(ct) => ct,
        Err(e) => {
            tracing::info!(
                user_id = %owner_id,
                filename = %upload.filename,
                size_bytes = upload.data.len(),
                "Upload rejected"
            );
            return Err(e);
        }
    };

    let stored_filename = unique_filename(&upload.filename);
    let size = upload.data.len() as u64;

    let (storage_key, locator) = state
        .storage
        .upload(owner_id, &stored_filename, &content_type, upload.data)
        .await?;

    tracing::info!(
        user_id = %owner_id,
        original_filename = %upload.filename,
        storage_key = %storage_key,
        size_bytes = size,
        content_type = %content_type,
        "File uploaded"
    );

    Ok(UploadedFile {
        original_filename: upload.filename,
        stored_filename,
        storage_key,
        size,
        content_type,
        locator,
    })
}
