//! Upload, listing, download and deletion of a user's files

use crate::auth::SessionContext;
use crate::error::HttpAppError;
use crate::services::upload::store_upload;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use pagevault_core::models::{StoredFile, UploadedFile};
use pagevault_core::AppError;
use pagevault_processing::validator::{expected_content_type, file_extension};
use pagevault_storage::keys::{generate_storage_key, original_filename, owner_prefix, secure_filename};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: UploadedFile,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Storage key of `filename` in the owner's namespace. Only names that are
/// already in stored form are accepted.
fn owner_key(owner_id: Uuid, filename: &str) -> Result<String, HttpAppError> {
    if secure_filename(filename).as_deref() != Some(filename) {
        return Err(AppError::InvalidInput(format!("Invalid filename: {}", filename)).into());
    }
    Ok(generate_storage_key(owner_id, filename))
}

/// POST /upload, POST /api/upload
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let upload = extract_multipart_file(multipart).await?;
    let file = store_upload(&state, session.user_id, upload).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file,
    }))
}

/// GET /files, GET /api/files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Json<FileListResponse>, HttpAppError> {
    let objects = state.storage.list(&owner_prefix(session.user_id)).await?;

    let files = objects
        .iter()
        .map(|obj| {
            let filename = obj.file_name().to_string();
            StoredFile {
                original_filename: original_filename(&filename),
                filename,
                size: obj.size,
                last_modified: obj.last_modified,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(user_id = %session.user_id, count = files.len(), "Files listed");

    Ok(Json(FileListResponse { files }))
}

/// GET /download/{filename}, GET /api/download/{filename}
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Path(filename): Path<String>,
) -> Result<Response, HttpAppError> {
    let key = owner_key(session.user_id, &filename)?;

    let size = state.storage.content_length(&key).await?;
    let stream = state.storage.download_stream(&key).await?;

    let content_type = file_extension(&filename)
        .and_then(|ext| expected_content_type(&ext))
        .unwrap_or("application/octet-stream");
    let disposition = format!(
        "attachment; filename=\"{}\"",
        original_filename(&filename)
    );

    tracing::info!(user_id = %session.user_id, storage_key = %key, size_bytes = size, "File download");

    Ok((
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn remove_file(state: &AppState, owner_id: Uuid, filename: &str) -> Result<(), HttpAppError> {
    let key = owner_key(owner_id, filename)?;

    if !state.storage.exists(&key).await? {
        return Err(AppError::NotFound(format!("File not found: {}", filename)).into());
    }
    state.storage.delete(&key).await?;

    tracing::info!(user_id = %owner_id, storage_key = %key, "File deleted");
    Ok(())
}

/// GET /delete/{filename}
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Path(filename): Path<String>,
) -> Result<Redirect, HttpAppError> {
    remove_file(&state, session.user_id, &filename).await?;
    Ok(Redirect::to("/files"))
}

/// DELETE /api/delete/{filename}
pub async fn api_delete_file(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    remove_file(&state, session.user_id, &filename).await?;
    Ok(Json(MessageResponse {
        message: format!("File {} deleted", filename),
    }))
}
