//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors
//! (`StorageError`, `ValidationError`, `PipelineStageError`) convert into
//! `HttpAppError` so they render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pagevault_core::{AppError, ErrorMetadata, LogLevel};
use pagevault_processing::{PipelineStageError, ValidationError};
use pagevault_storage::StorageError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: `AppError` lives in pagevault-core).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details are never shown in production, nor for sensitive errors.
        let (details, error_type) = if is_production || app_error.is_sensitive() {
            (None, None)
        } else {
            (
                Some(app_error.detailed_message()),
                Some(app_error.error_type().to_string()),
            )
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details,
            error_type,
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        });

        (status, body).into_response()
    }
}

// Domain errors -> HttpAppError

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DownloadFailed(msg)
            | StorageError::DeleteFailed(msg)
            | StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app = match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::InvalidInput(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<PipelineStageError> for HttpAppError {
    fn from(err: PipelineStageError) -> Self {
        HttpAppError(AppError::Pipeline {
            stage: err.stage.to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagevault_processing::PipelineStage;

    #[test]
    fn test_from_storage_error_not_found() {
        let HttpAppError(app_err) = StorageError::NotFound("uploads/u/a.pdf".to_string()).into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "uploads/u/a.pdf"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_backend_failure() {
        let HttpAppError(app_err) = StorageError::UploadFailed("timeout".to_string()).into();
        assert!(matches!(app_err, AppError::Storage(_)));
        assert_eq!(app_err.http_status_code(), 502);
    }

    #[test]
    fn test_from_storage_error_invalid_key() {
        let HttpAppError(app_err) = StorageError::InvalidKey("../x".to_string()).into();
        assert!(matches!(app_err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_from_validation_error_file_too_large() {
        let HttpAppError(app_err) = ValidationError::FileTooLarge {
            size: 1000,
            max: 500,
        }
        .into();
        match app_err {
            AppError::PayloadTooLarge(msg) => {
                assert!(msg.contains("1000"));
                assert!(msg.contains("500"));
            }
            _ => panic!("Expected PayloadTooLarge variant"),
        }
    }

    #[test]
    fn test_from_validation_error_invalid_extension() {
        let HttpAppError(app_err) = ValidationError::InvalidExtension {
            extension: "exe".to_string(),
            allowed: vec!["pdf".to_string(), "png".to_string()],
        }
        .into();
        match app_err {
            AppError::InvalidInput(msg) => {
                assert!(msg.contains("exe"));
                assert!(msg.contains("pdf"));
            }
            _ => panic!("Expected InvalidInput variant"),
        }
    }

    #[test]
    fn test_from_pipeline_error_names_stage() {
        let HttpAppError(app_err) =
            PipelineStageError::on_page(PipelineStage::Ocr, 2, "tesseract crashed").into();
        match &app_err {
            AppError::Pipeline { stage, .. } => assert_eq!(stage, "ocr"),
            _ => panic!("Expected Pipeline variant"),
        }
        assert_eq!(app_err.http_status_code(), 500);
        assert!(app_err.client_message().contains("ocr"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Not found".to_string(),
            details: None,
            error_type: None,
            code: "NOT_FOUND".to_string(),
            recoverable: false,
            suggested_action: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json.get("code").and_then(|v| v.as_str()), Some("NOT_FOUND"));
        assert!(json.get("recoverable").and_then(|v| v.as_bool()).is_some());
        assert!(json.get("details").is_none());
    }
}
