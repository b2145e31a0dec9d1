use anyhow::{Context, Result};
use pagevault_core::Config;
use pagevault_processing::{
    check_system_dependencies, DependencyReport, EnginePaths, GeminiClient, GenerativeModel,
    OutputTarget, PdfPipeline, PipelineConfig,
};
use pagevault_storage::Storage;
use std::sync::Arc;

/// Probe external tools and build the pipeline when an AI key is configured
pub async fn setup_processing(
    config: &Config,
    storage: Arc<dyn Storage>,
) -> Result<(Option<Arc<PdfPipeline>>, DependencyReport)> {
    let dependencies = check_system_dependencies(&EnginePaths::from_config(config)).await;
    for missing in dependencies.missing() {
        tracing::warn!(
            dependency = missing.name,
            path = %missing.path,
            "External tool not found; document processing will fail at this stage"
        );
    }

    let Some(client) = GeminiClient::from_config(config).context("Failed to create AI client")?
    else {
        tracing::warn!("GEMINI_API_KEY not set, document processing disabled");
        return Ok((None, dependencies));
    };

    let output = OutputTarget::from_config(config, storage).context("Failed to set up output target")?;
    let model: Arc<dyn GenerativeModel> = Arc::new(client);

    tracing::info!(
        model = %model.model_name(),
        output = output.kind(),
        max_page_workers = config.max_page_workers(),
        html_conversion_enabled = config.html_conversion_enabled(),
        "Document processing enabled"
    );

    let pipeline = PdfPipeline::new(PipelineConfig::from_config(config), model, output);
    Ok((Some(Arc::new(pipeline)), dependencies))
}
