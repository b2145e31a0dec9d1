use super::{strip_code_fences, AiError, GenerativeModel, ImageInput};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use pagevault_core::Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const JSON_TEMPERATURE: f32 = 0.1;

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    max_attempts: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        api_base: String,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            client,
        })
    }

    /// Build a client from configuration. Returns `None` without an API key.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AiError> {
        let Some(api_key) = config.gemini_api_key() else {
            return Ok(None);
        };

        let client = Self::new(
            api_key.to_string(),
            config.gemini_model().to_string(),
            config.gemini_api_base().to_string(),
            Duration::from_secs(config.ai_timeout_secs()),
        )?
        .with_retry(
            config.ai_max_retries(),
            Duration::from_secs(config.ai_retry_delay_secs()),
        );

        Ok(Some(client))
    }

    /// Total attempts per call and the base backoff delay (doubled per attempt).
    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    async fn send_once(&self, request: &GenerateRequest) -> Result<String, AiError> {
        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AiError::Blocked(reason));
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(AiError::EmptyResponse)?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason == "SAFETY" || reason == "BLOCKLIST" || reason == "PROHIBITED_CONTENT" {
                return Err(AiError::Blocked(reason.to_string()));
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(text)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, AiError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.retry_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        error = %e,
                        model = %self.model,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Gemini request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        model = %self.model,
                        attempts = attempt + 1,
                        "Gemini request failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<serde_json::Value, AiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                    inline_data: None,
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: JSON_TEMPERATURE,
                response_mime_type: "application/json".to_string(),
            }),
        };

        let text = self.generate(&request).await?;
        serde_json::from_str(strip_code_fences(&text)).map_err(|e| AiError::InvalidJson(e.to_string()))
    }

    async fn generate_text(
        &self,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> Result<String, AiError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: image.mime_type.clone(),
                    data: STANDARD.encode(&image.data),
                }),
            });
        }
        parts.push(Part {
            text: Some(prompt.to_string()),
            inline_data: None,
        });

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: None,
        };

        self.generate(&request).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
