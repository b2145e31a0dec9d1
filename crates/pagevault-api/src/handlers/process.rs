use crate::auth::SessionContext;
use crate::error::HttpAppError;
use crate::services::upload::validate_upload;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, State},
    Json,
};
use pagevault_core::models::ProcessingResult;
use pagevault_core::AppError;
use pagevault_processing::{DocumentInput, ProcessOptions};
use std::sync::Arc;

/// POST /api/process, POST /upload_pdf
///
/// Runs the processing pipeline over the uploaded document and returns the
/// result. Fails with 503 when no AI backend is configured.
pub async fn process_document(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Result<Json<ProcessingResult>, HttpAppError> {
    let pipeline = state.pipeline.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Document processing is not configured".to_string())
    })?;

    let upload = extract_multipart_file(multipart).await?;
    validate_upload(&state, &upload)?;

    tracing::info!(
        user_id = %session.user_id,
        filename = %upload.filename,
        size_bytes = upload.data.len(),
        folder_name = ?upload.folder_name,
        "Processing document"
    );

    let result = pipeline
        .process(
            DocumentInput {
                filename: upload.filename,
                data: upload.data,
            },
            ProcessOptions {
                owner_id: session.user_id,
                folder_name: upload.folder_name,
            },
        )
        .await?;

    Ok(Json(result))
}
