//! Page-level PDF operations backed by poppler-utils.

use super::command::{run_command, CommandError};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PDF_MAGIC: &[u8] = b"%PDF";

pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Missing(String),
}

/// Split `pdf` into one file per page inside `out_dir`, in page order.
pub async fn split_pages(
    pdfseparate: &str,
    pdf: &Path,
    out_dir: &Path,
    timeout: Duration,
) -> Result<Vec<PathBuf>, PdfError> {
    let pattern = out_dir.join("page_%d.pdf");
    run_command(
        pdfseparate,
        &[&path_arg(pdf), &path_arg(&pattern)],
        timeout,
    )
    .await?;

    let mut pages: Vec<(usize, PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(out_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(number) = name
            .to_str()
            .and_then(|n| n.strip_prefix("page_"))
            .and_then(|n| n.strip_suffix(".pdf"))
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };
        pages.push((number, entry.path()));
    }

    if pages.is_empty() {
        return Err(PdfError::Missing("document has no pages".to_string()));
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

/// Render a single-page PDF to `{out_prefix}.png`.
pub async fn render_page(
    pdftoppm: &str,
    page_pdf: &Path,
    out_prefix: &Path,
    dpi: u32,
    timeout: Duration,
) -> Result<PathBuf, PdfError> {
    let dpi = dpi.to_string();
    run_command(
        pdftoppm,
        &[
            "-png",
            "-r",
            &dpi,
            "-singlefile",
            &path_arg(page_pdf),
            &path_arg(out_prefix),
        ],
        timeout,
    )
    .await?;

    let image = out_prefix.with_extension("png");
    if !tokio::fs::try_exists(&image).await? {
        return Err(PdfError::Missing(format!(
            "renderer produced no image at {}",
            image.display()
        )));
    }
    Ok(image)
}

/// Concatenate `pages` into `output`.
pub async fn merge_pages(
    pdfunite: &str,
    pages: &[PathBuf],
    output: &Path,
    timeout: Duration,
) -> Result<(), PdfError> {
    match pages {
        [] => Err(PdfError::Missing("no pages to merge".to_string())),
        // pdfunite requires at least two inputs
        [single] => {
            tokio::fs::copy(single, output).await?;
            Ok(())
        }
        _ => {
            let mut args: Vec<String> = pages.iter().map(|p| path_arg(p)).collect();
            args.push(path_arg(output));
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            run_command(pdfunite, &args, timeout).await?;
            Ok(())
        }
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
