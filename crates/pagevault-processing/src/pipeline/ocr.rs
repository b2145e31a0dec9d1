use super::command::{run_command, CommandError};
use super::pdf::path_arg;
use std::path::Path;
use std::time::Duration;

/// Extract text from an image with tesseract, writing to stdout.
pub async fn extract_text(
    tesseract: &str,
    image: &Path,
    language: &str,
    timeout: Duration,
) -> Result<String, CommandError> {
    let stdout = run_command(
        tesseract,
        &[&path_arg(image), "stdout", "-l", language],
        timeout,
    )
    .await?;

    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}
