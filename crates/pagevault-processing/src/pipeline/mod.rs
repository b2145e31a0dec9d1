//! Document processing pipeline
//!
//! A PDF is split into pages, each page is rendered and OCR'd, pages that
//! contain tables are rebuilt as HTML and converted back to PDF, and the
//! pages are merged into one derived document. The extracted text is then
//! summarized and the derived PDF is handed to the configured output target.

pub mod command;
pub mod deps;
mod html;
mod ocr;
pub mod pdf;
mod stage;

pub use stage::{PipelineStage, PipelineStageError};

use crate::ai::{prompts, GenerativeModel, ImageInput, TableDetection};
use crate::output::OutputTarget;
use crate::validator::{expected_content_type, file_extension};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use pagevault_core::models::{PageOutcome, ProcessingResult};
use pagevault_core::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Upper bound for split, render, convert and merge commands
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Locations of the external tools
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub tesseract: String,
    pub pdftoppm: String,
    pub pdfseparate: String,
    pub pdfunite: String,
    pub wkhtmltopdf: String,
}

impl EnginePaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tesseract: config.tesseract_path().to_string(),
            pdftoppm: config.pdftoppm_path().to_string(),
            pdfseparate: config.pdfseparate_path().to_string(),
            pdfunite: config.pdfunite_path().to_string(),
            wkhtmltopdf: config.wkhtmltopdf_path().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub engines: EnginePaths,
    pub ocr_timeout: Duration,
    pub command_timeout: Duration,
    pub ocr_language: String,
    pub render_dpi: u32,
    pub max_page_workers: usize,
    pub html_conversion_enabled: bool,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            engines: EnginePaths::from_config(config),
            ocr_timeout: Duration::from_secs(config.ocr_timeout_secs()),
            command_timeout: COMMAND_TIMEOUT,
            ocr_language: config.ocr_language().to_string(),
            render_dpi: config.render_dpi(),
            max_page_workers: config.max_page_workers().max(1),
            html_conversion_enabled: config.html_conversion_enabled(),
        }
    }
}

/// A document handed to the pipeline
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub owner_id: Uuid,
    pub folder_name: Option<String>,
}

enum DocumentKind {
    Pdf,
    Image { mime_type: &'static str },
}

/// Outcome of one page, plus the file it contributes to the derived PDF
struct PageWork {
    outcome: PageOutcome,
    text: String,
    derived_pdf: Option<PathBuf>,
}

pub struct PdfPipeline {
    config: PipelineConfig,
    model: Arc<dyn GenerativeModel>,
    output: OutputTarget,
}

impl PdfPipeline {
    pub fn new(config: PipelineConfig, model: Arc<dyn GenerativeModel>, output: OutputTarget) -> Self {
        Self {
            config,
            model,
            output,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    /// Run every stage over `document`, stopping at the first failure.
    #[tracing::instrument(skip(self, document, options), fields(document = %document.filename, size_bytes = document.data.len()))]
    pub async fn process(
        &self,
        document: DocumentInput,
        options: ProcessOptions,
    ) -> Result<ProcessingResult, PipelineStageError> {
        let start = Instant::now();
        let kind = classify(&document)?;

        let scratch = tempfile::tempdir().map_err(|e| {
            PipelineStageError::new(
                PipelineStage::Input,
                format!("failed to create scratch directory: {}", e),
            )
        })?;

        let (pages, derived) = match kind {
            DocumentKind::Pdf => self.process_pdf(&document, scratch.path()).await?,
            DocumentKind::Image { mime_type } => {
                self.process_image(&document, mime_type, scratch.path()).await?
            }
        };

        let extracted_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let outcomes: Vec<PageOutcome> = pages.into_iter().map(|p| p.outcome).collect();

        let summary = self.summarize(&extracted_text).await?;

        let output_locator = match derived {
            Some(path) => {
                let pdf = tokio::fs::read(&path).await.map_err(|e| {
                    PipelineStageError::new(
                        PipelineStage::Output,
                        format!("failed to read derived PDF: {}", e),
                    )
                })?;
                let locator = self
                    .output
                    .deliver(
                        options.owner_id,
                        options.folder_name.as_deref(),
                        &document.filename,
                        pdf,
                    )
                    .await
                    .map_err(|e| PipelineStageError::new(PipelineStage::Output, e.to_string()))?;
                Some(locator)
            }
            None => None,
        };

        let result = ProcessingResult {
            id: Uuid::new_v4(),
            source_document: document.filename.clone(),
            page_count: outcomes.len(),
            extracted_text,
            pages: outcomes,
            output_locator,
            summary,
            created_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            result_id = %result.id,
            page_count = result.page_count,
            tables_detected = result.tables_detected(),
            has_output = result.output_locator.is_some(),
            has_summary = result.summary.is_some(),
            duration_ms = result.duration_ms,
            "Document processed"
        );

        Ok(result)
    }

    async fn process_pdf(
        &self,
        document: &DocumentInput,
        scratch: &Path,
    ) -> Result<(Vec<PageWork>, Option<PathBuf>), PipelineStageError> {
        let engines = &self.config.engines;
        let source = scratch.join("source.pdf");
        let pages_dir = scratch.join("pages");

        tokio::fs::write(&source, &document.data)
            .await
            .map_err(|e| PipelineStageError::new(PipelineStage::Split, e.to_string()))?;
        tokio::fs::create_dir_all(&pages_dir)
            .await
            .map_err(|e| PipelineStageError::new(PipelineStage::Split, e.to_string()))?;

        let page_files = pdf::split_pages(
            &engines.pdfseparate,
            &source,
            &pages_dir,
            self.config.command_timeout,
        )
        .await
        .map_err(|e| PipelineStageError::new(PipelineStage::Split, e.to_string()))?;

        tracing::debug!(page_count = page_files.len(), "Document split into pages");

        let pages: Vec<PageWork> = futures::stream::iter(page_files.into_iter().enumerate())
            .map(|(index, page_pdf)| self.process_pdf_page(index + 1, page_pdf, scratch))
            .buffered(self.config.max_page_workers)
            .try_collect()
            .await?;

        let merge_inputs: Vec<PathBuf> = pages
            .iter()
            .filter_map(|p| p.derived_pdf.clone())
            .collect();
        let merged = scratch.join("final_merged.pdf");
        pdf::merge_pages(
            &engines.pdfunite,
            &merge_inputs,
            &merged,
            self.config.command_timeout,
        )
        .await
        .map_err(|e| PipelineStageError::new(PipelineStage::Merge, e.to_string()))?;

        Ok((pages, Some(merged)))
    }

    async fn process_pdf_page(
        &self,
        page_number: usize,
        page_pdf: PathBuf,
        scratch: &Path,
    ) -> Result<PageWork, PipelineStageError> {
        let prefix = scratch.join(format!("page_{}_render", page_number));
        let image = pdf::render_page(
            &self.config.engines.pdftoppm,
            &page_pdf,
            &prefix,
            self.config.render_dpi,
            self.config.command_timeout,
        )
        .await
        .map_err(|e| PipelineStageError::on_page(PipelineStage::Rasterize, page_number, e.to_string()))?;

        let mut work = self
            .analyze_image(page_number, &image, "image/png", scratch)
            .await?;
        // Pages without a table keep their original rendering.
        if work.derived_pdf.is_none() {
            work.derived_pdf = Some(page_pdf);
        }
        Ok(work)
    }

    async fn process_image(
        &self,
        document: &DocumentInput,
        mime_type: &'static str,
        scratch: &Path,
    ) -> Result<(Vec<PageWork>, Option<PathBuf>), PipelineStageError> {
        let ext = file_extension(&document.filename).unwrap_or_else(|| "png".to_string());
        let image = scratch.join(format!("source.{}", ext));
        tokio::fs::write(&image, &document.data)
            .await
            .map_err(|e| PipelineStageError::new(PipelineStage::Input, e.to_string()))?;

        let work = self.analyze_image(1, &image, mime_type, scratch).await?;
        let derived = work.derived_pdf.clone();
        Ok((vec![work], derived))
    }

    /// OCR, table detection and, for table pages, HTML regeneration.
    async fn analyze_image(
        &self,
        page_number: usize,
        image: &Path,
        mime_type: &str,
        scratch: &Path,
    ) -> Result<PageWork, PipelineStageError> {
        let text = ocr::extract_text(
            &self.config.engines.tesseract,
            image,
            &self.config.ocr_language,
            self.config.ocr_timeout,
        )
        .await
        .map_err(|e| PipelineStageError::on_page(PipelineStage::Ocr, page_number, e.to_string()))?;

        let detection = if text.trim().is_empty() {
            tracing::debug!(page = page_number, "No text on page, skipping table detection");
            TableDetection::none()
        } else {
            let value = self
                .model
                .generate_json(&prompts::table_detection(&text))
                .await
                .map_err(|e| {
                    PipelineStageError::on_page(PipelineStage::TableDetection, page_number, e.to_string())
                })?;
            TableDetection::from_json(&value).map_err(|e| {
                PipelineStageError::on_page(PipelineStage::TableDetection, page_number, e.to_string())
            })?
        };

        tracing::debug!(
            page = page_number,
            text_chars = text.chars().count(),
            table_detected = detection.table_detected,
            confidence = detection.confidence,
            "Page analyzed"
        );

        let derived_pdf = if detection.table_detected && self.config.html_conversion_enabled {
            Some(
                self.regenerate_page(page_number, image, mime_type, &text, scratch)
                    .await?,
            )
        } else {
            None
        };

        Ok(PageWork {
            outcome: PageOutcome {
                page_number,
                text_chars: text.chars().count(),
                table_detected: detection.table_detected,
                confidence: detection.confidence,
                html_generated: derived_pdf.is_some(),
            },
            text,
            derived_pdf,
        })
    }

    async fn regenerate_page(
        &self,
        page_number: usize,
        image: &Path,
        mime_type: &str,
        text: &str,
        scratch: &Path,
    ) -> Result<PathBuf, PipelineStageError> {
        let data = tokio::fs::read(image).await.map_err(|e| {
            PipelineStageError::on_page(PipelineStage::HtmlGeneration, page_number, e.to_string())
        })?;
        let image_input = ImageInput {
            mime_type: mime_type.to_string(),
            data,
        };

        let response = self
            .model
            .generate_text(&prompts::html_generation(text), Some(&image_input))
            .await
            .map_err(|e| {
                PipelineStageError::on_page(PipelineStage::HtmlGeneration, page_number, e.to_string())
            })?;
        let html = html::clean_ai_html_response(&response);

        let html_file = scratch.join(format!("page_{}.html", page_number));
        let pdf_file = scratch.join(format!("page_{}_html.pdf", page_number));
        tokio::fs::write(&html_file, html).await.map_err(|e| {
            PipelineStageError::on_page(PipelineStage::HtmlGeneration, page_number, e.to_string())
        })?;

        html::html_to_pdf(
            &self.config.engines.wkhtmltopdf,
            &html_file,
            &pdf_file,
            self.config.command_timeout,
        )
        .await
        .map_err(|e| PipelineStageError::on_page(PipelineStage::HtmlToPdf, page_number, e.to_string()))?;

        Ok(pdf_file)
    }

    async fn summarize(&self, text: &str) -> Result<Option<String>, PipelineStageError> {
        if text.trim().is_empty() {
            tracing::debug!("No extracted text, skipping summary");
            return Ok(None);
        }

        let summary = self
            .model
            .generate_text(&prompts::summary(text), None)
            .await
            .map_err(|e| PipelineStageError::new(PipelineStage::Summarize, e.to_string()))?;

        Ok(Some(summary.trim().to_string()))
    }
}

fn classify(document: &DocumentInput) -> Result<DocumentKind, PipelineStageError> {
    let ext = file_extension(&document.filename).unwrap_or_default();

    if pdf::is_pdf(&document.data) {
        return Ok(DocumentKind::Pdf);
    }
    if ext == "pdf" {
        return Err(PipelineStageError::new(
            PipelineStage::Input,
            "file has a .pdf extension but is not a PDF document",
        ));
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        if let Some(mime_type) = expected_content_type(&ext) {
            return Ok(DocumentKind::Image { mime_type });
        }
    }

    Err(PipelineStageError::new(
        PipelineStage::Input,
        format!("unsupported document: {}", document.filename),
    ))
}
