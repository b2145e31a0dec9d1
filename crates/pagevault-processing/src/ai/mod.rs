//! Generative-AI access used by the processing pipeline.
//!
//! The pipeline only talks to [`GenerativeModel`]; [`GeminiClient`] is the
//! production implementation.

mod gemini;
pub mod prompts;
pub mod table;

pub use gemini::GeminiClient;
pub use table::TableDetection;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI response blocked: {0}")]
    Blocked(String),

    #[error("AI response contained no text")]
    EmptyResponse,

    #[error("AI response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("AI response has unexpected shape: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Network failures, rate limiting and server errors are worth retrying.
    /// A response that arrived but is unusable is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Request(_) => true,
            AiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Image attached to a prompt
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Ask for a JSON answer and parse it.
    async fn generate_json(&self, prompt: &str) -> Result<serde_json::Value, AiError>;

    /// Ask for free text, optionally with an image.
    async fn generate_text(
        &self,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> Result<String, AiError>;

    fn model_name(&self) -> &str;
}

/// Strip a surrounding Markdown code fence (```` ```json ```` / ```` ```html ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}
