use serde::Serialize;
use std::fmt;

/// Named stages of the PDF pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Input,
    Split,
    Rasterize,
    Ocr,
    TableDetection,
    HtmlGeneration,
    HtmlToPdf,
    Merge,
    Summarize,
    Output,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Input => "input",
            PipelineStage::Split => "split",
            PipelineStage::Rasterize => "rasterize",
            PipelineStage::Ocr => "ocr",
            PipelineStage::TableDetection => "table_detection",
            PipelineStage::HtmlGeneration => "html_generation",
            PipelineStage::HtmlToPdf => "html_to_pdf",
            PipelineStage::Merge => "merge",
            PipelineStage::Summarize => "summarize",
            PipelineStage::Output => "output",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one pipeline stage. Processing stops at the first one.
#[derive(Debug, Clone)]
pub struct PipelineStageError {
    pub stage: PipelineStage,
    pub page: Option<usize>,
    pub message: String,
}

impl PipelineStageError {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            page: None,
            message: message.into(),
        }
    }

    pub fn on_page(stage: PipelineStage, page: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            page: Some(page),
            message: message.into(),
        }
    }
}

impl fmt::Display for PipelineStageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(
                f,
                "{} stage failed on page {}: {}",
                self.stage, page, self.message
            ),
            None => write!(f, "{} stage failed: {}", self.stage, self.message),
        }
    }
}

impl std::error::Error for PipelineStageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_stage_and_page() {
        let err = PipelineStageError::on_page(PipelineStage::Ocr, 3, "tesseract exited with 1");
        assert_eq!(
            err.to_string(),
            "ocr stage failed on page 3: tesseract exited with 1"
        );

        let err = PipelineStageError::new(PipelineStage::HtmlToPdf, "timed out");
        assert_eq!(err.to_string(), "html_to_pdf stage failed: timed out");
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&PipelineStage::TableDetection).unwrap();
        assert_eq!(json, "\"table_detection\"");
    }
}
