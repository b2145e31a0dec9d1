//! Common utilities for file upload handlers

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use pagevault_core::AppError;
use pagevault_processing::ValidationError;

/// The `file` part of a multipart form plus the optional `folder_name` field
#[derive(Debug)]
pub struct MultipartUpload {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
    pub folder_name: Option<String>,
}

fn multipart_error(e: MultipartError, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: request body too large", context))
    } else {
        AppError::InvalidInput(format!("{}: {}", context, e))
    }
}

/// Extract the uploaded file from a multipart form.
/// Only one field named "file" is accepted; multiple file fields are rejected.
pub async fn extract_multipart_file(mut multipart: Multipart) -> Result<MultipartUpload, AppError> {
    let mut file: Option<(Vec<u8>, String, Option<String>)> = None;
    let mut folder_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart"))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read file data"))?;

                file = Some((data.to_vec(), filename, content_type));
            }
            "folder_name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read folder_name"))?;
                folder_name = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput(ValidationError::NoFile.to_string()))?;

    Ok(MultipartUpload {
        data,
        filename,
        content_type,
        folder_name,
    })
}
