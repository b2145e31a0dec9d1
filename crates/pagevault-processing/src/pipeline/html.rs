use super::command::{run_command, CommandError};
use super::pdf::path_arg;
use crate::ai::strip_code_fences;
use std::path::Path;
use std::time::Duration;

/// Turn a model reply into a standalone HTML document.
///
/// Code fences are removed, and a bare fragment is wrapped in a minimal page.
pub fn clean_ai_html_response(response: &str) -> String {
    let html = strip_code_fences(response);
    let lower = html.to_ascii_lowercase();
    if lower.starts_with("<!doctype") || lower.starts_with("<html") {
        return html.to_string();
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n{}\n</body>\n</html>\n",
        html
    )
}

/// Render `html_file` to `pdf_file` with wkhtmltopdf.
pub async fn html_to_pdf(
    wkhtmltopdf: &str,
    html_file: &Path,
    pdf_file: &Path,
    timeout: Duration,
) -> Result<(), CommandError> {
    run_command(
        wkhtmltopdf,
        &[
            "--enable-local-file-access",
            "--quiet",
            &path_arg(html_file),
            &path_arg(pdf_file),
        ],
        timeout,
    )
    .await?;
    Ok(())
}
