//! PageVault Processing Library
//!
//! Upload validation, the document processing pipeline (OCR, table
//! detection, HTML to PDF, summarization) and delivery of derived files.

pub mod ai;
pub mod output;
pub mod pipeline;
pub mod validator;

pub use ai::{AiError, GeminiClient, GenerativeModel, ImageInput};
pub use output::{OutputError, OutputTarget};
pub use pipeline::deps::{check_system_dependencies, DependencyReport, DependencyStatus};
pub use pipeline::{
    DocumentInput, EnginePaths, PdfPipeline, PipelineConfig, PipelineStage, PipelineStageError,
    ProcessOptions,
};
pub use validator::{FileValidator, ValidationError};
