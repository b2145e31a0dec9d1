use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-page outcome recorded by the processing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    pub page_number: usize,
    pub text_chars: usize,
    pub table_detected: bool,
    pub confidence: f64,
    pub html_generated: bool,
}

/// Result of one pipeline run. Each run produces a new result; results are
/// never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub id: Uuid,
    pub source_document: String,
    pub page_count: usize,
    pub extracted_text: String,
    pub pages: Vec<PageOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ProcessingResult {
    pub fn tables_detected(&self) -> usize {
        self.pages.iter().filter(|p| p.table_detected).count()
    }
}
