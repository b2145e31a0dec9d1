//! Error types module
//!
//! All request-facing failures are unified under `AppError`. Each variant
//! describes its own HTTP presentation through `ErrorMetadata` so the API
//! layer can render them consistently.

use std::io;

/// Level an error is logged at when it reaches the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Client mistakes: bad input, missing files, no session
    Debug,
    Warn,
    /// Backend or pipeline failures
    Error,
}

/// Response presentation of an error
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable machine-readable code such as `STORAGE_ERROR`
    fn error_code(&self) -> &'static str;

    /// Retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to the client
    fn client_message(&self) -> String;

    /// Hide `details` from clients even outside production
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Pipeline stage '{stage}' failed: {message}")]
    Pipeline { stage: String, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// How a variant is presented to clients and logs
struct Presentation {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

const fn client_fault(status: u16, code: &'static str, action: &'static str) -> Presentation {
    Presentation {
        status,
        code,
        recoverable: false,
        action: Some(action),
        sensitive: false,
        level: LogLevel::Debug,
    }
}

const INTERNAL: Presentation = Presentation {
    status: 500,
    code: "INTERNAL_ERROR",
    recoverable: true,
    action: Some("Retry after a short delay"),
    sensitive: true,
    level: LogLevel::Error,
};

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::InvalidInput(_) => client_fault(
                400,
                "INVALID_INPUT",
                "Check the file type and request parameters",
            ),
            AppError::PayloadTooLarge(_) => {
                client_fault(413, "PAYLOAD_TOO_LARGE", "Reduce file size and try again")
            }
            AppError::NotFound(_) => client_fault(
                404,
                "NOT_FOUND",
                "Verify the file name exists in your file list",
            ),
            AppError::Unauthorized(_) => client_fault(401, "UNAUTHORIZED", "Log in and retry"),
            AppError::Conflict(_) => client_fault(409, "CONFLICT", "Choose a different value"),
            // Backend details (bucket names, paths) stay out of responses
            AppError::Storage(_) => Presentation {
                status: 502,
                code: "STORAGE_ERROR",
                ..INTERNAL
            },
            AppError::Pipeline { .. } => Presentation {
                code: "PIPELINE_STAGE_ERROR",
                action: Some("Check the document and retry"),
                sensitive: false,
                ..INTERNAL
            },
            AppError::ServiceUnavailable(_) => Presentation {
                status: 503,
                code: "SERVICE_UNAVAILABLE",
                action: Some("Retry later or contact the administrator"),
                sensitive: false,
                level: LogLevel::Warn,
                ..INTERNAL
            },
            AppError::Internal(_) | AppError::InternalWithSource { .. } => INTERNAL,
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::NotFound(_) => "NotFound",
            AppError::Storage(_) => "Storage",
            AppError::Pipeline { .. } => "PipelineStage",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Conflict(_) => "Conflict",
            AppError::ServiceUnavailable(_) => "ServiceUnavailable",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Display text followed by up to five causes
    pub fn detailed_message(&self) -> String {
        let mut details = self.to_string();
        let mut causes = std::iter::successors(std::error::Error::source(self), |e| e.source());

        for cause in causes.by_ref().take(MAX_CAUSES) {
            details.push_str("\n  Caused by: ");
            details.push_str(&cause.to_string());
        }
        if causes.next().is_some() {
            details.push_str("\n  ... (truncated)");
        }
        details
    }
}

const MAX_CAUSES: usize = 5;

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_recoverable(&self) -> bool {
        self.presentation().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.presentation().action
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Conflict(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Pipeline { stage, .. } => {
                format!("Processing failed during the {} stage", stage)
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
